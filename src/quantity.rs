#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum ResourceKind {
    Cpu,
    Memory,
}

impl ResourceKind {
    pub fn title(self) -> &'static str {
        match self {
            Self::Cpu => "CPU",
            Self::Memory => "Memory",
        }
    }
}

// Binary suffixes must be checked before their decimal counterparts.
const MEMORY_UNITS: [(&str, u64); 13] = [
    ("Ki", 1 << 10),
    ("Mi", 1 << 20),
    ("Gi", 1 << 30),
    ("Ti", 1 << 40),
    ("Pi", 1 << 50),
    ("Ei", 1 << 60),
    ("K", 1_000),
    ("k", 1_000),
    ("M", 1_000_000),
    ("G", 1_000_000_000),
    ("T", 1_000_000_000_000),
    ("P", 1_000_000_000_000_000),
    ("E", 1_000_000_000_000_000_000),
];

pub fn parse(value: &str, kind: ResourceKind) -> u64 {
    let raw = value.trim();
    if raw.is_empty() {
        return 0;
    }

    match kind {
        ResourceKind::Cpu => parse_cpu_millicores(raw),
        ResourceKind::Memory => parse_memory_bytes(raw),
    }
}

fn parse_cpu_millicores(raw: &str) -> u64 {
    if let Some(number) = raw.strip_suffix('m') {
        return leading_integer(number).unwrap_or(0);
    }

    scaled(raw, 1_000).map(f64::round).map_or(0, to_magnitude)
}

fn parse_memory_bytes(raw: &str) -> u64 {
    let (number, multiplier) = MEMORY_UNITS
        .iter()
        .find_map(|(suffix, multiplier)| Some((raw.strip_suffix(*suffix)?, *multiplier)))
        .unwrap_or((raw, 1));

    leading_integer(number).map_or(0, |value| value.saturating_mul(multiplier))
}

// Leading digits only: `1.5` reads as 1, `-1` and `abc` as nothing.
fn leading_integer(number: &str) -> Option<u64> {
    let digits = number.strip_prefix('+').unwrap_or(number);
    let end = digits
        .find(|ch: char| !ch.is_ascii_digit())
        .unwrap_or(digits.len());
    let digits = &digits[..end];
    if digits.is_empty() {
        return None;
    }
    Some(digits.parse::<u64>().unwrap_or(u64::MAX))
}

fn scaled(number: &str, multiplier: u64) -> Option<f64> {
    let numeric = number.parse::<f64>().ok()?;
    let value = numeric * multiplier as f64;
    (value.is_finite() && value >= 0.0).then_some(value)
}

fn to_magnitude(value: f64) -> u64 {
    value as u64
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ResourceUsage {
    pub kind: ResourceKind,
    pub request_text: String,
    pub limit_text: String,
    pub request: u64,
    pub limit: u64,
}

impl ResourceUsage {
    pub fn new(request: &str, limit: &str, kind: ResourceKind) -> Self {
        Self {
            kind,
            request_text: request.trim().to_string(),
            limit_text: limit.trim().to_string(),
            request: parse(request, kind),
            limit: parse(limit, kind),
        }
    }

    pub fn is_set(&self) -> bool {
        !self.request_text.is_empty() || !self.limit_text.is_empty()
    }

    pub fn percent(&self) -> Option<u64> {
        if self.limit == 0 {
            return None;
        }
        let percent = (self.request as f64 / self.limit as f64 * 100.0).min(100.0);
        Some(percent.round() as u64)
    }

    pub fn label(&self) -> String {
        if !self.is_set() {
            return "Not set".to_string();
        }
        format!(
            "{}/{}",
            display_or_dash(&self.request_text),
            display_or_dash(&self.limit_text)
        )
    }
}

fn display_or_dash(value: &str) -> &str {
    if value.is_empty() { "-" } else { value }
}

pub fn format_millicores(value: u64) -> String {
    if value >= 1_000 {
        let cores = value as f64 / 1_000.0;
        format!("{cores:.2}c")
    } else {
        format!("{value}m")
    }
}

pub fn format_bytes(value: u64) -> String {
    const UNITS: [(&str, f64); 6] = [
        ("Ei", 1_152_921_504_606_846_976.0),
        ("Pi", 1_125_899_906_842_624.0),
        ("Ti", 1_099_511_627_776.0),
        ("Gi", 1_073_741_824.0),
        ("Mi", 1_048_576.0),
        ("Ki", 1_024.0),
    ];
    if value == 0 {
        return "0B".to_string();
    }

    let value_f64 = value as f64;
    for (suffix, unit_size) in UNITS {
        if value_f64 >= unit_size {
            return format!("{:.1}{suffix}", value_f64 / unit_size);
        }
    }
    format!("{value}B")
}
