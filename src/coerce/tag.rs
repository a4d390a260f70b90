use crate::error::ProbeError;

use std::str::FromStr;

/// Output representation requested on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeTag {
    Int,
    String,
    Avg,
    StringList,
}

impl TypeTag {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Int => "int",
            Self::String => "string",
            Self::Avg => "avg",
            Self::StringList => "string_list",
        }
    }
}

impl FromStr for TypeTag {
    type Err = ProbeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "int" => Ok(Self::Int),
            "string" => Ok(Self::String),
            "avg" => Ok(Self::Avg),
            "string_list" => Ok(Self::StringList),
            other => Err(ProbeError::UnknownTypeTag(other.to_string())),
        }
    }
}
