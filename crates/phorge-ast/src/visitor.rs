use crate::ast::*;

/// Read-only traversal over the syntax tree. Every method defaults to the
/// matching `walk_*` function, so implementors override only the nodes they
/// care about and call `walk_*` to keep descending.
pub trait Visitor {
    fn visit_program(&mut self, program: &Program) {
        walk_program(self, program);
    }

    fn visit_stmt(&mut self, stmt: &Stmt) {
        walk_stmt(self, stmt);
    }

    fn visit_expr(&mut self, expr: &Expr) {
        walk_expr(self, expr);
    }

    fn visit_param(&mut self, param: &Param) {
        walk_param(self, param);
    }

    fn visit_type(&mut self, _ty: &Type) {}

    fn visit_attribute(&mut self, attribute: &Attribute) {
        walk_attribute(self, attribute);
    }

    fn visit_class_member(&mut self, member: &ClassMember) {
        walk_class_member(self, member);
    }

    fn visit_property_hook(&mut self, hook: &PropertyHook) {
        walk_property_hook(self, hook);
    }
}

pub fn walk_program<V: Visitor + ?Sized>(visitor: &mut V, program: &Program) {
    for stmt in &program.stmts {
        visitor.visit_stmt(stmt);
    }
}

fn walk_stmts<V: Visitor + ?Sized>(visitor: &mut V, stmts: &[Stmt]) {
    for stmt in stmts {
        visitor.visit_stmt(stmt);
    }
}

fn walk_exprs<V: Visitor + ?Sized>(visitor: &mut V, exprs: &[Expr]) {
    for expr in exprs {
        visitor.visit_expr(expr);
    }
}

fn walk_attributes<V: Visitor + ?Sized>(visitor: &mut V, attributes: &[Attribute]) {
    for attribute in attributes {
        visitor.visit_attribute(attribute);
    }
}

fn walk_signature<V: Visitor + ?Sized>(visitor: &mut V, params: &[Param], return_type: Option<&Type>) {
    for param in params {
        visitor.visit_param(param);
    }
    if let Some(ty) = return_type {
        visitor.visit_type(ty);
    }
}

fn walk_members<V: Visitor + ?Sized>(visitor: &mut V, members: &[ClassMember]) {
    for member in members {
        visitor.visit_class_member(member);
    }
}

fn walk_const<V: Visitor + ?Sized>(visitor: &mut V, decl: &ConstDecl) {
    walk_attributes(visitor, &decl.attributes);
    if let Some(ty) = &decl.type_hint {
        visitor.visit_type(ty);
    }
    for clause in &decl.clauses {
        visitor.visit_expr(&clause.value);
    }
}

fn walk_class<V: Visitor + ?Sized>(visitor: &mut V, class: &ClassDecl) {
    walk_attributes(visitor, &class.attributes);
    walk_members(visitor, &class.members);
}

pub fn walk_stmt<V: Visitor + ?Sized>(visitor: &mut V, stmt: &Stmt) {
    match &stmt.kind {
        StmtKind::Expression(expr) => visitor.visit_expr(expr),
        StmtKind::Echo(exprs) | StmtKind::Unset(exprs) | StmtKind::Global(exprs) => {
            walk_exprs(visitor, exprs)
        }
        StmtKind::Return(expr) | StmtKind::Break(expr) | StmtKind::Continue(expr) => {
            if let Some(expr) = expr {
                visitor.visit_expr(expr);
            }
        }
        StmtKind::Block(stmts) => walk_stmts(visitor, stmts),
        StmtKind::If(if_stmt) => {
            visitor.visit_expr(&if_stmt.condition);
            visitor.visit_stmt(&if_stmt.then_branch);
            for elseif in &if_stmt.elseif_branches {
                visitor.visit_expr(&elseif.condition);
                visitor.visit_stmt(&elseif.body);
            }
            if let Some(else_branch) = &if_stmt.else_branch {
                visitor.visit_stmt(else_branch);
            }
        }
        StmtKind::While(while_stmt) => {
            visitor.visit_expr(&while_stmt.condition);
            visitor.visit_stmt(&while_stmt.body);
        }
        StmtKind::DoWhile(do_while) => {
            visitor.visit_stmt(&do_while.body);
            visitor.visit_expr(&do_while.condition);
        }
        StmtKind::For(for_stmt) => {
            walk_exprs(visitor, &for_stmt.init);
            walk_exprs(visitor, &for_stmt.condition);
            walk_exprs(visitor, &for_stmt.update);
            visitor.visit_stmt(&for_stmt.body);
        }
        StmtKind::Foreach(foreach) => {
            visitor.visit_expr(&foreach.subject);
            if let Some(key) = &foreach.key {
                visitor.visit_expr(key);
            }
            visitor.visit_expr(&foreach.value);
            visitor.visit_stmt(&foreach.body);
        }
        StmtKind::Switch(switch) => {
            visitor.visit_expr(&switch.subject);
            for case in &switch.cases {
                if let Some(value) = &case.value {
                    visitor.visit_expr(value);
                }
                walk_stmts(visitor, &case.body);
            }
        }
        StmtKind::Declare(declare) => {
            for directive in &declare.directives {
                visitor.visit_expr(&directive.value);
            }
            if let Some(body) = &declare.body {
                visitor.visit_stmt(body);
            }
        }
        StmtKind::TryCatch(try_catch) => {
            walk_stmts(visitor, &try_catch.body);
            for catch in &try_catch.catches {
                walk_stmts(visitor, &catch.body);
            }
            if let Some(finally) = &try_catch.finally {
                walk_stmts(visitor, finally);
            }
        }
        StmtKind::StaticVar(vars) => {
            for var in vars {
                if let Some(default) = &var.default {
                    visitor.visit_expr(default);
                }
            }
        }
        StmtKind::Function(func) => {
            walk_attributes(visitor, &func.attributes);
            walk_signature(visitor, &func.params, func.return_type.as_ref());
            walk_stmts(visitor, &func.body);
        }
        StmtKind::Class(class) => walk_class(visitor, class),
        StmtKind::Interface(iface) => {
            walk_attributes(visitor, &iface.attributes);
            walk_members(visitor, &iface.members);
        }
        StmtKind::Trait(trait_decl) => {
            walk_attributes(visitor, &trait_decl.attributes);
            walk_members(visitor, &trait_decl.members);
        }
        StmtKind::Enum(enum_decl) => {
            walk_attributes(visitor, &enum_decl.attributes);
            if let Some(ty) = &enum_decl.backing_type {
                visitor.visit_type(ty);
            }
            walk_members(visitor, &enum_decl.members);
        }
        StmtKind::Namespace(ns) => {
            if let NamespaceBody::Braced(stmts) = &ns.body {
                walk_stmts(visitor, stmts);
            }
        }
        StmtKind::Const(decl) => walk_const(visitor, decl),
        StmtKind::Use(_)
        | StmtKind::Goto(_)
        | StmtKind::Label(_)
        | StmtKind::InlineHtml(_)
        | StmtKind::Nop
        | StmtKind::Error => {}
    }
}

pub fn walk_expr<V: Visitor + ?Sized>(visitor: &mut V, expr: &Expr) {
    match &expr.kind {
        ExprKind::InterpolatedString(parts)
        | ExprKind::Heredoc { parts, .. }
        | ExprKind::ShellExec(parts) => {
            for part in parts {
                if let StringPart::Expr(e) = part {
                    visitor.visit_expr(e);
                }
            }
        }
        ExprKind::VariableVariable(inner)
        | ExprKind::CallableCreate(inner)
        | ExprKind::Clone(inner)
        | ExprKind::Spread(inner)
        | ExprKind::Cast(_, inner)
        | ExprKind::Empty(inner)
        | ExprKind::Eval(inner)
        | ExprKind::Print(inner)
        | ExprKind::Include(_, inner)
        | ExprKind::Throw(inner)
        | ExprKind::Parenthesized(inner) => visitor.visit_expr(inner),
        ExprKind::Assign(assign) => {
            visitor.visit_expr(&assign.target);
            visitor.visit_expr(&assign.value);
        }
        ExprKind::Binary(binary) => {
            visitor.visit_expr(&binary.left);
            visitor.visit_expr(&binary.right);
        }
        ExprKind::Unary(unary) => visitor.visit_expr(&unary.operand),
        ExprKind::Postfix(postfix) => visitor.visit_expr(&postfix.operand),
        ExprKind::Ternary(ternary) => {
            visitor.visit_expr(&ternary.condition);
            if let Some(then_expr) = &ternary.then_expr {
                visitor.visit_expr(then_expr);
            }
            visitor.visit_expr(&ternary.else_expr);
        }
        ExprKind::Coalesce(coalesce) => {
            visitor.visit_expr(&coalesce.left);
            visitor.visit_expr(&coalesce.right);
        }
        ExprKind::Pipe(pipe) => {
            visitor.visit_expr(&pipe.input);
            visitor.visit_expr(&pipe.callable);
        }
        ExprKind::Call(call) => {
            visitor.visit_expr(&call.callee);
            walk_exprs(visitor, &call.args);
        }
        ExprKind::MemberAccess(access) => {
            visitor.visit_expr(&access.object);
            visitor.visit_expr(&access.member);
        }
        ExprKind::ArrayAccess(access) => {
            visitor.visit_expr(&access.array);
            if let Some(index) = &access.index {
                visitor.visit_expr(index);
            }
        }
        ExprKind::Array(elements) | ExprKind::List(elements) => {
            for element in elements {
                if let Some(key) = &element.key {
                    visitor.visit_expr(key);
                }
                visitor.visit_expr(&element.value);
            }
        }
        ExprKind::New(new) => {
            visitor.visit_expr(&new.class);
            walk_exprs(visitor, &new.args);
        }
        ExprKind::AnonymousClass(class) => walk_class(visitor, class),
        ExprKind::Match(m) => {
            visitor.visit_expr(&m.subject);
            for arm in &m.arms {
                if let Some(conditions) = &arm.conditions {
                    walk_exprs(visitor, conditions);
                }
                visitor.visit_expr(&arm.body);
            }
        }
        ExprKind::Closure(closure) => {
            walk_attributes(visitor, &closure.attributes);
            walk_signature(visitor, &closure.params, closure.return_type.as_ref());
            walk_stmts(visitor, &closure.body);
        }
        ExprKind::ArrowFunction(arrow) => {
            walk_attributes(visitor, &arrow.attributes);
            walk_signature(visitor, &arrow.params, arrow.return_type.as_ref());
            visitor.visit_expr(&arrow.body);
        }
        ExprKind::NamedArgument(arg) => visitor.visit_expr(&arg.value),
        ExprKind::Isset(vars) => walk_exprs(visitor, vars),
        ExprKind::Exit(inner) => {
            if let Some(inner) = inner {
                visitor.visit_expr(inner);
            }
        }
        ExprKind::Yield(y) => {
            if let Some(key) = &y.key {
                visitor.visit_expr(key);
            }
            if let Some(value) = &y.value {
                visitor.visit_expr(value);
            }
        }
        ExprKind::Int(_)
        | ExprKind::Float(_)
        | ExprKind::String(_)
        | ExprKind::Nowdoc { .. }
        | ExprKind::Bool(_)
        | ExprKind::Null
        | ExprKind::Variable(_)
        | ExprKind::Name(_)
        | ExprKind::MagicConst(_) => {}
    }
}

pub fn walk_param<V: Visitor + ?Sized>(visitor: &mut V, param: &Param) {
    walk_attributes(visitor, &param.attributes);
    if let Some(ty) = &param.type_hint {
        visitor.visit_type(ty);
    }
    if let Some(default) = &param.default {
        visitor.visit_expr(default);
    }
    for hook in &param.hooks {
        visitor.visit_property_hook(hook);
    }
}

pub fn walk_attribute<V: Visitor + ?Sized>(visitor: &mut V, attribute: &Attribute) {
    walk_exprs(visitor, &attribute.args);
}

pub fn walk_class_member<V: Visitor + ?Sized>(visitor: &mut V, member: &ClassMember) {
    match &member.kind {
        ClassMemberKind::Property(prop) => {
            walk_attributes(visitor, &prop.attributes);
            if let Some(ty) = &prop.type_hint {
                visitor.visit_type(ty);
            }
            if let Some(default) = &prop.default {
                visitor.visit_expr(default);
            }
            for hook in &prop.hooks {
                visitor.visit_property_hook(hook);
            }
        }
        ClassMemberKind::Method(method) => {
            walk_attributes(visitor, &method.attributes);
            walk_signature(visitor, &method.params, method.return_type.as_ref());
            if let Some(body) = &method.body {
                walk_stmts(visitor, body);
            }
        }
        ClassMemberKind::Constant(decl) => walk_const(visitor, decl),
        ClassMemberKind::Case(case) => {
            walk_attributes(visitor, &case.attributes);
            if let Some(value) = &case.value {
                visitor.visit_expr(value);
            }
        }
        ClassMemberKind::TraitUse(_) => {}
    }
}

pub fn walk_property_hook<V: Visitor + ?Sized>(visitor: &mut V, hook: &PropertyHook) {
    walk_attributes(visitor, &hook.attributes);
    for param in &hook.params {
        visitor.visit_param(param);
    }
    match &hook.body {
        PropertyHookBody::Block(stmts) => walk_stmts(visitor, stmts),
        PropertyHookBody::Expression(expr) => visitor.visit_expr(expr),
        PropertyHookBody::Abstract => {}
    }
}
