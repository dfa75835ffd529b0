use std::fmt;

/// Pages shown before the label list starts collapsing into ellipses.
const MAX_VISIBLE_PAGES: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageLabel {
    Page(u32),
    Ellipsis,
}

impl fmt::Display for PageLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageLabel::Page(n) => write!(f, "{}", n),
            PageLabel::Ellipsis => f.write_str("…"),
        }
    }
}

/// Current page plus page count. Pages are 1-indexed and there is always at
/// least one page, even for an empty result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
    current: u32,
    total: u32,
}

impl Default for Paginator {
    fn default() -> Self {
        Self { current: 1, total: 1 }
    }
}

impl Paginator {
    pub fn new(current: u32, total: u32) -> Self {
        let total = total.max(1);
        Self {
            current: current.clamp(1, total),
            total,
        }
    }

    pub fn current(&self) -> u32 {
        self.current
    }

    pub fn total(&self) -> u32 {
        self.total
    }

    pub fn set_total(&mut self, total: u32) {
        self.total = total.max(1);
        self.current = self.current.clamp(1, self.total);
    }

    pub fn has_next(&self) -> bool {
        self.current < self.total
    }

    pub fn has_previous(&self) -> bool {
        self.current > 1
    }

    pub fn next(&mut self) -> bool {
        self.go_to(self.current.saturating_add(1))
    }

    pub fn previous(&mut self) -> bool {
        self.go_to(self.current.saturating_sub(1))
    }

    /// Clamp into `[1, total]`. Returns whether the page actually changed.
    pub fn go_to(&mut self, page: u32) -> bool {
        let target = page.clamp(1, self.total);
        let changed = target != self.current;
        self.current = target;
        changed
    }

    pub fn reset(&mut self) {
        self.current = 1;
    }

    pub fn page_numbers(&self) -> Vec<PageLabel> {
        let total = self.total;
        if total <= MAX_VISIBLE_PAGES {
            return (1..=total).map(PageLabel::Page).collect();
        }

        let current = self.current;
        let (start, end) = if current <= 2 {
            (2, 4)
        } else if current >= total - 1 {
            (total - 3, total - 1)
        } else {
            (current - 1, current + 1)
        };

        let mut labels = vec![PageLabel::Page(1)];
        if start > 2 {
            labels.push(PageLabel::Ellipsis);
        }
        labels.extend((start..=end).map(PageLabel::Page));
        if end < total - 1 {
            labels.push(PageLabel::Ellipsis);
        }
        labels.push(PageLabel::Page(total));
        labels
    }
}

/// Number of pages needed for `items` at `page_size`, never less than one.
pub fn page_count(items: u64, page_size: u32) -> u32 {
    if page_size == 0 {
        return 1;
    }
    let pages = items.div_ceil(u64::from(page_size));
    u32::try_from(pages).unwrap_or(u32::MAX).max(1)
}

pub fn render_labels(paginator: &Paginator) -> String {
    paginator
        .page_numbers()
        .iter()
        .map(|label| match label {
            PageLabel::Page(n) if *n == paginator.current() => format!("[{}]", n),
            other => other.to_string(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}
