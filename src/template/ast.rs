//! Parsed form of a mapping template.

use crate::value::Value;

/// Where a path expression starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Root {
    Args,
    Source,
    Stash,
    Result,
}

impl Root {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "args" | "arguments" => Some(Root::Args),
            "source" => Some(Root::Source),
            "stash" => Some(Root::Stash),
            "result" => Some(Root::Result),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Root::Args => "args",
            Root::Source => "source",
            Root::Stash => "stash",
            Root::Result => "result",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PathRef {
    pub root: Root,
    pub segments: Vec<String>,
}

impl std::fmt::Display for PathRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.root.name())?;
        for segment in &self.segments {
            write!(f, ".{}", segment)?;
        }
        Ok(())
    }
}

/// The fixed helper set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Helper {
    FreshId,
    NowTimestamp,
    ToEncoded,
    ToEncodedMap,
    DefaultIfNull,
    DefaultIfBlank,
    IsNull,
    RaiseError,
}

impl Helper {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "freshId" => Some(Helper::FreshId),
            "nowTimestamp" => Some(Helper::NowTimestamp),
            "toEncoded" => Some(Helper::ToEncoded),
            "toEncodedMap" => Some(Helper::ToEncodedMap),
            "defaultIfNull" => Some(Helper::DefaultIfNull),
            "defaultIfBlank" => Some(Helper::DefaultIfBlank),
            "isNull" => Some(Helper::IsNull),
            "raiseError" => Some(Helper::RaiseError),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Helper::FreshId => "freshId",
            Helper::NowTimestamp => "nowTimestamp",
            Helper::ToEncoded => "toEncoded",
            Helper::ToEncodedMap => "toEncodedMap",
            Helper::DefaultIfNull => "defaultIfNull",
            Helper::DefaultIfBlank => "defaultIfBlank",
            Helper::IsNull => "isNull",
            Helper::RaiseError => "raiseError",
        }
    }

    pub fn arity(&self) -> usize {
        match self {
            Helper::FreshId | Helper::NowTimestamp => 0,
            Helper::ToEncoded | Helper::ToEncodedMap | Helper::IsNull | Helper::RaiseError => 1,
            Helper::DefaultIfNull | Helper::DefaultIfBlank => 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Value),
    Path(PathRef),
    Call { helper: Helper, args: Vec<Expr> },
    Conditional(Box<Conditional>),
    Object(Vec<(String, Expr)>),
    List(Vec<Expr>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Conditional {
    pub condition: Expr,
    pub then_branch: Block,
    pub else_branch: Option<Block>,
}

/// A run of items; its value is the value of its final expression item.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Block {
    pub items: Vec<Item>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    SetStash { key: String, value: Expr },
    Expr(Expr),
}
