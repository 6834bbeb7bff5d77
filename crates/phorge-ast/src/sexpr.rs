//! Compact S-expression rendering of expressions, used in diagnostics and
//! tests. Parentheses in the source are transparent: grouping already shows
//! in the nesting.

use std::fmt::{self, Write};

use crate::ast::*;

impl Expr {
    pub fn sexpr(&self) -> String {
        SExpr(self).to_string()
    }
}

/// `Display` adapter producing the S-expression form of an [`Expr`].
pub struct SExpr<'a>(pub &'a Expr);

impl fmt::Display for SExpr<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_expr(f, self.0)
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, head: &str, items: &[Expr]) -> fmt::Result {
    f.write_char('(')?;
    f.write_str(head)?;
    for item in items {
        f.write_char(' ')?;
        write_expr(f, item)?;
    }
    f.write_char(')')
}

fn write_one(f: &mut fmt::Formatter<'_>, head: &str, inner: &Expr) -> fmt::Result {
    write!(f, "({head} ")?;
    write_expr(f, inner)?;
    f.write_char(')')
}

fn write_parts(f: &mut fmt::Formatter<'_>, head: &str, parts: &[StringPart]) -> fmt::Result {
    write!(f, "({head}")?;
    for part in parts {
        f.write_char(' ')?;
        match part {
            StringPart::Literal(text) => write!(f, "{text:?}")?,
            StringPart::Expr(expr) => write_expr(f, expr)?,
        }
    }
    f.write_char(')')
}

fn write_elements(f: &mut fmt::Formatter<'_>, head: &str, elements: &[ArrayElement]) -> fmt::Result {
    write!(f, "({head}")?;
    for element in elements {
        f.write_char(' ')?;
        match &element.key {
            Some(key) => {
                f.write_str("(=> ")?;
                write_expr(f, key)?;
                f.write_char(' ')?;
                write_expr(f, &element.value)?;
                f.write_char(')')?;
            }
            None => write_expr(f, &element.value)?,
        }
    }
    f.write_char(')')
}

fn write_expr(f: &mut fmt::Formatter<'_>, expr: &Expr) -> fmt::Result {
    match &expr.kind {
        ExprKind::Int(value) => write!(f, "{value}"),
        ExprKind::Float(value) => write!(f, "{value:?}"),
        ExprKind::String(value) => write!(f, "{value:?}"),
        ExprKind::Nowdoc { value, .. } => write!(f, "{value:?}"),
        ExprKind::InterpolatedString(parts) => write_parts(f, "interp", parts),
        ExprKind::Heredoc { parts, .. } => write_parts(f, "heredoc", parts),
        ExprKind::ShellExec(parts) => write_parts(f, "shell", parts),
        ExprKind::Bool(value) => write!(f, "{value}"),
        ExprKind::Null => f.write_str("null"),

        ExprKind::Variable(name) => write!(f, "${name}"),
        ExprKind::VariableVariable(inner) => {
            f.write_str("($ ")?;
            write_expr(f, inner)?;
            f.write_char(')')
        }
        ExprKind::Name(name) => write!(f, "{name}"),

        ExprKind::Assign(assign) => {
            let op = assign.op.as_str();
            let suffix = if assign.by_ref { "&" } else { "" };
            write!(f, "({op}{suffix} ")?;
            write_expr(f, &assign.target)?;
            f.write_char(' ')?;
            write_expr(f, &assign.value)?;
            f.write_char(')')
        }
        ExprKind::Binary(binary) => {
            write!(f, "({} ", binary.op.as_str())?;
            write_expr(f, &binary.left)?;
            f.write_char(' ')?;
            write_expr(f, &binary.right)?;
            f.write_char(')')
        }
        ExprKind::Unary(unary) => {
            write!(f, "({} ", unary.op.as_str())?;
            write_expr(f, &unary.operand)?;
            f.write_char(')')
        }
        ExprKind::Postfix(postfix) => {
            write!(f, "(post{} ", postfix.op.as_str())?;
            write_expr(f, &postfix.operand)?;
            f.write_char(')')
        }
        ExprKind::Ternary(ternary) => {
            match &ternary.then_expr {
                Some(then_expr) => {
                    f.write_str("(? ")?;
                    write_expr(f, &ternary.condition)?;
                    f.write_char(' ')?;
                    write_expr(f, then_expr)?;
                }
                None => {
                    f.write_str("(?: ")?;
                    write_expr(f, &ternary.condition)?;
                }
            }
            f.write_char(' ')?;
            write_expr(f, &ternary.else_expr)?;
            f.write_char(')')
        }
        ExprKind::Coalesce(coalesce) => {
            f.write_str("(?? ")?;
            write_expr(f, &coalesce.left)?;
            f.write_char(' ')?;
            write_expr(f, &coalesce.right)?;
            f.write_char(')')
        }
        ExprKind::Pipe(pipe) => {
            f.write_str("(|> ")?;
            write_expr(f, &pipe.input)?;
            f.write_char(' ')?;
            write_expr(f, &pipe.callable)?;
            f.write_char(')')
        }

        ExprKind::Call(call) => {
            f.write_str("(call ")?;
            write_expr(f, &call.callee)?;
            for arg in &call.args {
                f.write_char(' ')?;
                write_expr(f, arg)?;
            }
            f.write_char(')')
        }
        ExprKind::CallableCreate(callee) => {
            f.write_str("(callable ")?;
            write_expr(f, callee)?;
            f.write_char(')')
        }
        ExprKind::MemberAccess(access) => {
            write!(f, "({} ", access.kind.as_str())?;
            write_expr(f, &access.object)?;
            f.write_char(' ')?;
            write_expr(f, &access.member)?;
            f.write_char(')')
        }
        ExprKind::ArrayAccess(access) => {
            f.write_str("([] ")?;
            write_expr(f, &access.array)?;
            if let Some(index) = &access.index {
                f.write_char(' ')?;
                write_expr(f, index)?;
            }
            f.write_char(')')
        }
        ExprKind::Array(elements) => write_elements(f, "array", elements),
        ExprKind::List(elements) => write_elements(f, "list", elements),

        ExprKind::New(new) => {
            f.write_str("(new ")?;
            write_expr(f, &new.class)?;
            for arg in &new.args {
                f.write_char(' ')?;
                write_expr(f, arg)?;
            }
            f.write_char(')')
        }
        ExprKind::AnonymousClass(_) => f.write_str("(class)"),
        ExprKind::Clone(inner) => write_one(f, "clone", inner),
        ExprKind::Match(m) => {
            f.write_str("(match ")?;
            write_expr(f, &m.subject)?;
            for arm in &m.arms {
                f.write_char(' ')?;
                match &arm.conditions {
                    Some(conditions) => {
                        f.write_char('(')?;
                        for (i, condition) in conditions.iter().enumerate() {
                            if i > 0 {
                                f.write_char(' ')?;
                            }
                            write_expr(f, condition)?;
                        }
                        f.write_char(')')?;
                    }
                    None => f.write_str("default")?,
                }
                f.write_str(" => ")?;
                write_expr(f, &arm.body)?;
            }
            f.write_char(')')
        }
        ExprKind::Closure(closure) => {
            let head = if closure.is_static { "static-closure" } else { "closure" };
            write!(f, "({head}/{})", closure.params.len())
        }
        ExprKind::ArrowFunction(arrow) => {
            let head = if arrow.is_static { "static-fn" } else { "fn" };
            write!(f, "({head}/{} ", arrow.params.len())?;
            write_expr(f, &arrow.body)?;
            f.write_char(')')
        }
        ExprKind::NamedArgument(arg) => {
            write!(f, "({}: ", arg.name)?;
            write_expr(f, &arg.value)?;
            f.write_char(')')
        }
        ExprKind::Spread(inner) => write_one(f, "...", inner),
        ExprKind::MagicConst(kind) => f.write_str(kind.as_str()),
        ExprKind::Cast(kind, inner) => {
            write!(f, "(({}) ", kind.as_str())?;
            write_expr(f, inner)?;
            f.write_char(')')
        }

        ExprKind::Isset(vars) => write_list(f, "isset", vars),
        ExprKind::Empty(inner) => write_one(f, "empty", inner),
        ExprKind::Exit(inner) => match inner {
            Some(inner) => write_one(f, "exit", inner),
            None => f.write_str("(exit)"),
        },
        ExprKind::Eval(inner) => write_one(f, "eval", inner),
        ExprKind::Print(inner) => write_one(f, "print", inner),
        ExprKind::Include(kind, inner) => {
            let head = match kind {
                IncludeKind::Include => "include",
                IncludeKind::IncludeOnce => "include_once",
                IncludeKind::Require => "require",
                IncludeKind::RequireOnce => "require_once",
            };
            write_one(f, head, inner)
        }
        ExprKind::Yield(y) => {
            f.write_str(if y.from { "(yield-from" } else { "(yield" })?;
            if let Some(key) = &y.key {
                f.write_char(' ')?;
                write_expr(f, key)?;
            }
            if let Some(value) = &y.value {
                f.write_char(' ')?;
                write_expr(f, value)?;
            }
            f.write_char(')')
        }
        ExprKind::Throw(inner) => write_one(f, "throw", inner),

        ExprKind::Parenthesized(inner) => write_expr(f, inner),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Span;

    fn expr(kind: ExprKind) -> Expr {
        Expr {
            kind,
            span: Span::DUMMY,
        }
    }

    fn var(name: &str) -> Expr {
        expr(ExprKind::Variable(name.into()))
    }

    #[test]
    fn test_binary_nesting() {
        let e = expr(ExprKind::Binary(BinaryExpr {
            left: Box::new(expr(ExprKind::Int(1))),
            op: BinaryOp::Add,
            right: Box::new(expr(ExprKind::Binary(BinaryExpr {
                left: Box::new(expr(ExprKind::Int(2))),
                op: BinaryOp::Mul,
                right: Box::new(expr(ExprKind::Int(3))),
            }))),
        }));
        assert_eq!(e.sexpr(), "(+ 1 (* 2 3))");
    }

    #[test]
    fn test_parentheses_are_transparent() {
        let e = expr(ExprKind::Parenthesized(Box::new(var("a"))));
        assert_eq!(e.sexpr(), "$a");
    }

    #[test]
    fn test_short_ternary_and_reference_assign() {
        let ternary = expr(ExprKind::Ternary(TernaryExpr {
            condition: Box::new(var("a")),
            then_expr: None,
            else_expr: Box::new(var("b")),
        }));
        assert_eq!(ternary.sexpr(), "(?: $a $b)");

        let assign = expr(ExprKind::Assign(AssignExpr {
            target: Box::new(var("a")),
            op: AssignOp::Assign,
            by_ref: true,
            value: Box::new(var("b")),
        }));
        assert_eq!(assign.sexpr(), "(=& $a $b)");
    }

    #[test]
    fn test_strings_are_quoted() {
        let e = expr(ExprKind::String("a\"b".into()));
        assert_eq!(e.sexpr(), r#""a\"b""#);
    }
}
