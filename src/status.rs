use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum StatusClass {
    Running,
    Pending,
    Succeeded,
    Failed,
    Terminating,
    Unknown,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum StatusTone {
    Green,
    Yellow,
    Blue,
    Red,
    Orange,
    Gray,
}

impl StatusClass {
    pub fn classify(status: &str) -> Self {
        match status.to_ascii_lowercase().as_str() {
            "running" => Self::Running,
            "pending" | "containercreating" => Self::Pending,
            "succeeded" | "completed" => Self::Succeeded,
            "failed" | "error" | "crashloopbackoff" | "imagepullbackoff" | "errimagepull" => {
                Self::Failed
            }
            "terminating" => Self::Terminating,
            _ => Self::Unknown,
        }
    }

    pub fn is_running(self) -> bool {
        self == Self::Running
    }

    pub fn is_failed(self) -> bool {
        self == Self::Failed
    }

    // Lower ranks need attention first.
    pub fn rank(self) -> u8 {
        match self {
            Self::Failed => 0,
            Self::Terminating => 1,
            Self::Pending => 2,
            Self::Unknown => 3,
            Self::Running => 4,
            Self::Succeeded => 5,
        }
    }

    pub fn tone(self) -> StatusTone {
        match self {
            Self::Running => StatusTone::Green,
            Self::Pending => StatusTone::Yellow,
            Self::Succeeded => StatusTone::Blue,
            Self::Failed => StatusTone::Red,
            Self::Terminating => StatusTone::Orange,
            Self::Unknown => StatusTone::Gray,
        }
    }

    pub fn pulses(self) -> bool {
        matches!(self, Self::Running | Self::Pending | Self::Terminating)
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::Running => "Running",
            Self::Pending => "Pending",
            Self::Succeeded => "Succeeded",
            Self::Failed => "Failed",
            Self::Terminating => "Terminating",
            Self::Unknown => "Unknown",
        }
    }
}

impl Display for StatusClass {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.title())
    }
}

pub fn is_running(status: &str) -> bool {
    StatusClass::classify(status).is_running()
}

pub fn is_failed(status: &str) -> bool {
    StatusClass::classify(status).is_failed()
}
