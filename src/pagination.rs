use serde::{Deserialize, Serialize};

pub const LIMIT_FLAG: &str = "--limit";
pub const PAGE_FLAG: &str = "--page";

// `limit == 0` means "everything"; pages are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageWindow {
    pub limit: usize,
    pub page: usize,
}

impl Default for PageWindow {
    fn default() -> Self {
        Self { limit: 0, page: 1 }
    }
}

impl PageWindow {
    pub fn new(limit: usize, page: usize) -> Self {
        Self {
            limit,
            page: page.max(1),
        }
    }

    pub fn is_default(&self) -> bool {
        self.limit == 0 && self.page <= 1
    }

    pub fn from_args(args: &[String]) -> Result<(Self, Vec<String>), String> {
        let mut window = Self::default();
        let mut rest = Vec::new();
        let mut iter = args.iter();
        while let Some(arg) = iter.next() {
            match arg.as_str() {
                LIMIT_FLAG | "-l" => window.limit = parse_flag_value(LIMIT_FLAG, iter.next())?,
                PAGE_FLAG | "-p" => {
                    window.page = parse_flag_value(PAGE_FLAG, iter.next())?.max(1)
                }
                _ => rest.push(arg.clone()),
            }
        }
        Ok((window, rest))
    }
}

fn parse_flag_value(flag: &str, value: Option<&String>) -> Result<usize, String> {
    let raw = value.ok_or_else(|| format!("{flag} requires a value"))?;
    raw.parse::<usize>()
        .map_err(|_| format!("{flag} expects a non-negative integer, got `{raw}`"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageInfo {
    pub page: usize,
    pub limit: usize,
    pub total: usize,
    pub showing: usize,
    pub has_more: bool,
}

pub fn paginate<T>(items: &[T], window: PageWindow) -> (&[T], PageInfo) {
    let total = items.len();
    let mut info = PageInfo {
        page: window.page,
        limit: window.limit,
        total,
        showing: total,
        has_more: false,
    };

    if window.limit == 0 {
        return (items, info);
    }

    let start = window.page.max(1).saturating_sub(1).saturating_mul(window.limit);
    if start >= total {
        info.showing = 0;
        return (&items[..0], info);
    }

    let end = start.saturating_add(window.limit).min(total);
    info.showing = end - start;
    info.has_more = end < total;
    (&items[start..end], info)
}
