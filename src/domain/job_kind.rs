use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobKind {
    Convert,
    Parse,
}

impl JobKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobKind::Convert => "convert",
            JobKind::Parse => "parse",
        }
    }
}

impl FromStr for JobKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "convert" => Ok(JobKind::Convert),
            "parse" => Ok(JobKind::Parse),
            _ => Err(format!("Invalid job kind: {}", s)),
        }
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
