use std::fmt;

/// Grammar region the parser is currently inside. Pushed and popped around
/// nested constructs; consulted where the same tokens mean different things
/// in different places.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParsingContext {
    TopLevel,
    Function,
    Method,
    Closure,
    ArrowFunction,
    Class,
    Interface,
    Trait,
    Enum,
    Match,
    UnionType,
    IntersectionType,
    PropertyHook,
}

impl ParsingContext {
    pub fn as_str(self) -> &'static str {
        match self {
            ParsingContext::TopLevel => "top_level",
            ParsingContext::Function => "function",
            ParsingContext::Method => "method",
            ParsingContext::Closure => "closure",
            ParsingContext::ArrowFunction => "arrow_function",
            ParsingContext::Class => "class",
            ParsingContext::Interface => "interface",
            ParsingContext::Trait => "trait",
            ParsingContext::Enum => "enum",
            ParsingContext::Match => "match",
            ParsingContext::UnionType => "union_type",
            ParsingContext::IntersectionType => "intersection_type",
            ParsingContext::PropertyHook => "property_hook",
        }
    }

    /// Bodies whose members go through the class-member loop.
    pub fn is_class_like(self) -> bool {
        matches!(
            self,
            ParsingContext::Class
                | ParsingContext::Interface
                | ParsingContext::Trait
                | ParsingContext::Enum
        )
    }

    /// Regions with their own local variable scope.
    pub fn is_function_like(self) -> bool {
        matches!(
            self,
            ParsingContext::Function
                | ParsingContext::Method
                | ParsingContext::Closure
                | ParsingContext::ArrowFunction
                | ParsingContext::PropertyHook
        )
    }
}

impl fmt::Display for ParsingContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
