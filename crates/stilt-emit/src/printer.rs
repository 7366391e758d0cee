//! Printer - Emits annotation-dialect JavaScript from rewritten trees
//!
//! Walks a statement list and prints plain JavaScript: classes at the
//! runtime level with all type syntax erased, leading block comments on
//! their own lines, inline cast comments attached directly to their
//! parenthesized expression.

use stilt_ast::{
    modifiers, BindingName, FunctionLike, NodeArena, NodeId, NodeKind, VarKind,
};

/// Print a top-level statement list.
pub fn print_statements(arena: &NodeArena, statements: &[NodeId]) -> String {
    let mut printer = Printer {
        arena,
        out: String::new(),
        indent_level: 0,
    };
    for &stmt in statements {
        printer.emit_statement(stmt);
    }
    printer.out
}

struct Printer<'a> {
    arena: &'a NodeArena,
    out: String,
    indent_level: u32,
}

impl<'a> Printer<'a> {
    fn write(&mut self, text: &str) {
        self.out.push_str(text);
    }

    fn write_line(&mut self) {
        self.out.push('\n');
    }

    fn write_indent(&mut self) {
        for _ in 0..self.indent_level {
            self.out.push_str("    ");
        }
    }

    fn emit_leading_comments(&mut self, node: NodeId) {
        for comment in self.arena.comments.leading(node).to_vec() {
            self.write_indent();
            self.write(&comment.text);
            self.write_line();
        }
    }

    fn emit_statement(&mut self, stmt: NodeId) {
        let Some(node) = self.arena.get(stmt) else {
            return;
        };
        if !matches!(node.kind, NodeKind::NotEmittedStatement) {
            self.emit_leading_comments(stmt);
        }
        match &node.kind {
            NodeKind::NotEmittedStatement => {
                // Comments only; the statement itself was erased.
                self.emit_leading_comments(stmt);
            }
            NodeKind::ForwardDeclareStatement(fd) => {
                self.write_indent();
                if fd.explicitly_imported {
                    self.write(&format!(
                        "var {} = goog.forwardDeclare(\"{}\");",
                        fd.alias, fd.module_name
                    ));
                } else {
                    self.write(&format!("goog.forwardDeclare(\"{}\");", fd.module_name));
                }
                self.write_line();
            }
            NodeKind::ImportDecl(import) => {
                self.write_indent();
                match &import.clause {
                    None => self.write(&format!("import \"{}\";", import.module_specifier)),
                    Some(clause) => {
                        self.write("import ");
                        let mut wrote_binding = false;
                        if let Some(default_name) = &clause.default_name {
                            self.write(default_name);
                            wrote_binding = true;
                        }
                        if let Some(namespace) = &clause.namespace_name {
                            if wrote_binding {
                                self.write(", ");
                            }
                            self.write(&format!("* as {namespace}"));
                            wrote_binding = true;
                        }
                        if !wrote_binding || !clause.named.is_empty() {
                            if wrote_binding {
                                self.write(", ");
                            }
                            let specs: Vec<String> = clause
                                .named
                                .iter()
                                .map(|s| match &s.property_name {
                                    Some(original) => format!("{original} as {}", s.name),
                                    None => s.name.clone(),
                                })
                                .collect();
                            self.write(&format!("{{{}}}", specs.join(", ")));
                        }
                        self.write(&format!(" from \"{}\";", import.module_specifier));
                    }
                }
                self.write_line();
            }
            NodeKind::VariableStatement(vs) => {
                self.write_indent();
                if vs.modifiers & modifiers::EXPORT != 0 {
                    self.write("export ");
                }
                self.write(match vs.kind {
                    VarKind::Var => "var ",
                    VarKind::Let => "let ",
                    VarKind::Const => "const ",
                });
                for (i, &decl) in vs.declarations.iter().enumerate() {
                    if i > 0 {
                        self.write(", ");
                    }
                    self.emit_declarator(decl);
                }
                self.write(";");
                self.write_line();
            }
            NodeKind::ExpressionStatement(expr) => {
                let expr = *expr;
                self.write_indent();
                self.emit_expression(expr);
                self.write(";");
                self.write_line();
            }
            NodeKind::IfStatement(if_stmt) => {
                self.write_indent();
                self.write("if (");
                self.emit_expression(if_stmt.condition);
                self.write(") ");
                self.emit_block_or_statement(if_stmt.then_branch);
                if let Some(else_branch) = if_stmt.else_branch {
                    self.write(" else ");
                    self.emit_block_or_statement(else_branch);
                }
                self.write_line();
            }
            NodeKind::Block(_) => {
                self.write_indent();
                self.emit_block_or_statement(stmt);
                self.write_line();
            }
            NodeKind::FunctionDecl(func) => {
                self.write_indent();
                if func.modifiers & modifiers::EXPORT != 0 {
                    self.write("export ");
                }
                self.write(&format!("function {}(", func.name.as_deref().unwrap_or("")));
                self.emit_params(&func.params);
                self.write(") ");
                match func.body {
                    Some(body) => self.emit_block_or_statement(body),
                    None => self.write("{}"),
                }
                self.write_line();
            }
            NodeKind::ClassDecl(class) => {
                self.write_indent();
                if class.modifiers & modifiers::EXPORT != 0 {
                    self.write("export ");
                }
                self.write("class");
                if let Some(name) = &class.name {
                    self.write(&format!(" {name}"));
                }
                for clause in &class.heritage {
                    if clause.token == stilt_ast::HeritageToken::Extends {
                        if let Some(&base) = clause.types.first() {
                            self.write(" extends ");
                            self.emit_expression(base);
                        }
                    }
                }
                self.write(" {");
                self.write_line();
                self.indent_level += 1;
                for &member in &class.members {
                    self.emit_class_member(member);
                }
                self.indent_level -= 1;
                self.write_indent();
                self.write("}");
                self.write_line();
            }
            // Erased forms: type-only declarations have no runtime shape.
            NodeKind::TypeAliasDecl(_)
            | NodeKind::InterfaceDecl(_)
            | NodeKind::ImportEqualsDecl(_)
            | NodeKind::EnumDecl(_)
            | NodeKind::ModuleDecl(_) => {}
            _ => {
                self.write_indent();
                self.emit_expression(stmt);
                self.write(";");
                self.write_line();
            }
        }
    }

    fn emit_class_member(&mut self, member: NodeId) {
        let Some(node) = self.arena.get(member) else {
            return;
        };
        match &node.kind {
            NodeKind::Constructor(func) => {
                self.emit_leading_comments(member);
                self.write_indent();
                self.write("constructor(");
                self.emit_params(&func.params);
                self.write(") ");
                match func.body {
                    Some(body) => self.emit_block_or_statement(body),
                    None => self.write("{}"),
                }
                self.write_line();
            }
            NodeKind::MethodDecl(func) | NodeKind::GetAccessor(func) | NodeKind::SetAccessor(func) => {
                if func.body.is_none() {
                    // Overload signatures and abstract methods live in the
                    // member-type declaration instead.
                    return;
                }
                self.emit_leading_comments(member);
                self.write_indent();
                if func.modifiers & modifiers::STATIC != 0 {
                    self.write("static ");
                }
                match &node.kind {
                    NodeKind::GetAccessor(_) => self.write("get "),
                    NodeKind::SetAccessor(_) => self.write("set "),
                    _ => {}
                }
                self.write(&format!("{}(", func.name.as_deref().unwrap_or("")));
                self.emit_params(&func.params);
                self.write(") ");
                if let Some(body) = func.body {
                    self.emit_block_or_statement(body);
                }
                self.write_line();
            }
            NodeKind::PropertyDecl(prop) => {
                // Only initialized properties survive at the runtime level.
                let Some(init) = prop.initializer else {
                    return;
                };
                let Some(name) = &prop.name else {
                    return;
                };
                self.emit_leading_comments(member);
                self.write_indent();
                if prop.modifiers & modifiers::STATIC != 0 {
                    self.write("static ");
                }
                self.write(&format!("{name} = "));
                self.emit_expression(init);
                self.write(";");
                self.write_line();
            }
            _ => {}
        }
    }

    fn emit_declarator(&mut self, decl: NodeId) {
        let Some(declarator) = self.arena.get(decl).and_then(|n| n.as_variable_declaration())
        else {
            return;
        };
        let name = match &declarator.name {
            BindingName::Ident(name) => name.clone(),
            BindingName::Pattern => {
                // The rewriter never splits or annotates patterns; echo the
                // source text through.
                self.arena.source_slice(decl).to_string()
            }
        };
        let initializer = declarator.initializer;
        self.write(&name);
        if let Some(init) = initializer {
            self.write(" = ");
            self.emit_expression(init);
        }
    }

    fn emit_params(&mut self, params: &[NodeId]) {
        for (i, &param) in params.iter().enumerate() {
            if i > 0 {
                self.write(", ");
            }
            let Some(p) = self.arena.get(param).and_then(|n| n.as_param()) else {
                continue;
            };
            if p.dot_dot_dot {
                self.write("...");
            }
            match &p.name {
                BindingName::Ident(name) => self.write(&name.clone()),
                BindingName::Pattern => {
                    let text = self.arena.source_slice(param).to_string();
                    self.write(&text);
                }
            }
            if let Some(init) = p.initializer {
                self.write(" = ");
                self.emit_expression(init);
            }
        }
    }

    fn emit_block_or_statement(&mut self, stmt: NodeId) {
        if let Some(NodeKind::Block(stmts)) = self.arena.kind(stmt) {
            let stmts = stmts.clone();
            if stmts.is_empty() {
                self.write("{}");
                return;
            }
            self.write("{");
            self.write_line();
            self.indent_level += 1;
            for inner in stmts {
                self.emit_statement(inner);
            }
            self.indent_level -= 1;
            self.write_indent();
            self.write("}");
        } else {
            self.emit_statement(stmt);
        }
    }

    fn emit_expression(&mut self, expr: NodeId) {
        // Inline comments (casts) ride immediately before the expression.
        for comment in self.arena.comments.leading(expr).to_vec() {
            self.write(&comment.text);
            if comment.has_trailing_newline {
                self.write_line();
                self.write_indent();
            } else {
                self.write(" ");
            }
        }
        let Some(node) = self.arena.get(expr) else {
            return;
        };
        match &node.kind {
            NodeKind::Ident(name) => {
                let name = name.clone();
                self.write(&name);
            }
            NodeKind::StringLit(value) => {
                let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
                self.write(&format!("\"{escaped}\""));
            }
            NodeKind::NumberLit(value) => {
                let value = value.clone();
                self.write(&value);
            }
            NodeKind::BoolLit(value) => {
                self.write(if *value { "true" } else { "false" });
            }
            NodeKind::PropertyAccess(access) => {
                let (object, property) = (access.object, access.property.clone());
                self.emit_expression(object);
                self.write(&format!(".{property}"));
            }
            NodeKind::ElementAccess(access) => {
                let (object, index) = (access.object, access.index);
                self.emit_expression(object);
                self.write("[");
                self.emit_expression(index);
                self.write("]");
            }
            NodeKind::CallExpr(call) => {
                let (callee, args) = (call.callee, call.args.clone());
                self.emit_expression(callee);
                self.write("(");
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        self.write(", ");
                    }
                    self.emit_expression(*arg);
                }
                self.write(")");
            }
            NodeKind::Paren(inner) => {
                let inner = *inner;
                self.write("(");
                self.emit_expression(inner);
                self.write(")");
            }
            NodeKind::Assignment(assign) => {
                let (left, right) = (assign.left, assign.right);
                self.emit_expression(left);
                self.write(" = ");
                self.emit_expression(right);
            }
            NodeKind::FunctionExpr(func) => {
                let func = (**func).clone();
                self.emit_function_expr(&func);
            }
            _ => {}
        }
    }

    fn emit_function_expr(&mut self, func: &FunctionLike) {
        self.write("function");
        if let Some(name) = &func.name {
            self.write(&format!(" {name}"));
        }
        self.write("(");
        self.emit_params(&func.params);
        self.write(") ");
        match func.body {
            Some(body) => self.emit_block_or_statement(body),
            None => self.write("{}"),
        }
    }
}
