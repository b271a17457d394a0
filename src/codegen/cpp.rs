use crate::ast;
use crate::codegen::CompileError;
use codespan::FileId;
use std::collections::{BTreeSet, HashSet};

/// Runtime features observed by the discovery pass. Each one pulls in the
/// headers (and helpers) its lowering needs, so the emitted include set is
/// minimal for the given program.
#[derive(Debug, Default, Clone, Copy)]
struct Features {
    strings: bool,
    arrays: bool,
    objects: bool,
    classes: bool,
    heap_instances: bool,
    printing: bool,
    debug_print: bool,
}

/// Lowers a parsed program to C++ source text.
///
/// The walk happens twice: a discovery pass with emission suppressed to
/// learn which includes are needed, then the real emission pass. All state
/// is per-instance and reset at the top of `generate`, so one backend can be
/// reused and independent backends never interfere.
pub struct CppBackend {
    file_id: FileId,
    lines: Vec<String>,
    indent: usize,
    includes: BTreeSet<&'static str>,
    declared: HashSet<String>,
    tmp_counter: u32,
}

impl CppBackend {
    pub fn new(file_id: FileId) -> Self {
        Self {
            file_id,
            lines: Vec::new(),
            indent: 0,
            includes: BTreeSet::new(),
            declared: HashSet::new(),
            tmp_counter: 0,
        }
    }

    pub fn generate(&mut self, program: &ast::Program) -> Result<String, CompileError> {
        self.lines.clear();
        self.indent = 0;
        self.includes.clear();
        self.declared.clear();
        self.tmp_counter = 0;

        let features = self.discover(program);
        self.apply_includes(features);

        for include in &self.includes {
            self.lines.push(format!("#include {}", include));
        }
        if !self.includes.is_empty() {
            self.emit("");
        }

        if features.printing {
            self.emit_print_helper();
            self.emit("");
        }

        self.emit("using namespace std;");
        self.emit("");

        // Forward-declare every class so definitions and main may refer to
        // each other regardless of source order.
        let class_names: Vec<&str> = program
            .body
            .iter()
            .filter_map(|stmt| match stmt {
                ast::Stmt::Class(class) => Some(class.name.as_str()),
                _ => None,
            })
            .collect();
        if !class_names.is_empty() {
            for name in &class_names {
                self.emit(&format!("struct {};", name));
            }
            self.emit("");
        }

        for stmt in &program.body {
            match stmt {
                ast::Stmt::Class(class) => {
                    self.emit_class(class)?;
                    self.emit("");
                }
                ast::Stmt::Function(func) => {
                    self.emit_function(func)?;
                    self.emit("");
                }
                _ => {}
            }
        }

        self.emit("int main() {");
        self.indent += 1;
        self.declared.clear();
        for stmt in &program.body {
            if !matches!(stmt, ast::Stmt::Function(_) | ast::Stmt::Class(_)) {
                self.emit_stmt(stmt)?;
            }
        }
        self.emit("return 0;");
        self.indent -= 1;
        self.emit("}");

        Ok(self.lines.join("\n") + "\n")
    }

    // ---- discovery pass ----------------------------------------------

    fn discover(&self, program: &ast::Program) -> Features {
        let mut features = Features::default();
        for stmt in &program.body {
            self.scan_stmt(stmt, &mut features);
        }
        features
    }

    fn scan_stmt(&self, stmt: &ast::Stmt, features: &mut Features) {
        match stmt {
            ast::Stmt::VarDecl(decl) => {
                if let Some(init) = &decl.init {
                    self.scan_expr(init, features);
                }
            }
            ast::Stmt::Expr(expr, _) => self.scan_expr(expr, features),
            ast::Stmt::Block(block) => {
                for stmt in &block.body {
                    self.scan_stmt(stmt, features);
                }
            }
            ast::Stmt::If(stmt) => self.scan_if(stmt, features),
            ast::Stmt::While { test, body, .. } => {
                self.scan_expr(test, features);
                for stmt in &body.body {
                    self.scan_stmt(stmt, features);
                }
            }
            ast::Stmt::For(stmt) => {
                match &stmt.init {
                    Some(ast::ForInit::VarDecl(decl)) => {
                        if let Some(init) = &decl.init {
                            self.scan_expr(init, features);
                        }
                    }
                    Some(ast::ForInit::Expr(expr)) => self.scan_expr(expr, features),
                    None => {}
                }
                if let Some(test) = &stmt.test {
                    self.scan_expr(test, features);
                }
                if let Some(update) = &stmt.update {
                    self.scan_expr(update, features);
                }
                for stmt in &stmt.body.body {
                    self.scan_stmt(stmt, features);
                }
            }
            ast::Stmt::Function(func) => {
                for stmt in &func.body.body {
                    self.scan_stmt(stmt, features);
                }
            }
            ast::Stmt::Class(class) => {
                features.classes = true;
                for method in &class.body {
                    for stmt in &method.body.body {
                        self.scan_stmt(stmt, features);
                    }
                }
            }
            ast::Stmt::Return { argument, .. } => {
                if let Some(expr) = argument {
                    self.scan_expr(expr, features);
                }
            }
        }
    }

    fn scan_if(&self, stmt: &ast::IfStmt, features: &mut Features) {
        self.scan_expr(&stmt.test, features);
        for stmt in &stmt.consequent.body {
            self.scan_stmt(stmt, features);
        }
        match stmt.alternate.as_deref() {
            Some(ast::ElseBranch::ElseIf(else_if)) => self.scan_if(else_if, features),
            Some(ast::ElseBranch::Else(block)) => {
                for stmt in &block.body {
                    self.scan_stmt(stmt, features);
                }
            }
            None => {}
        }
    }

    fn scan_expr(&self, expr: &ast::Expr, features: &mut Features) {
        match expr {
            ast::Expr::Ident(..)
            | ast::Expr::Int(..)
            | ast::Expr::Bool(..)
            | ast::Expr::This(..) => {}
            ast::Expr::Str(..) => features.strings = true,
            ast::Expr::Array(elements, _) => {
                features.arrays = true;
                for element in elements {
                    self.scan_expr(element, features);
                }
            }
            ast::Expr::Object(properties, _) => {
                features.objects = true;
                for property in properties {
                    self.scan_expr(&property.value, features);
                }
            }
            ast::Expr::New { callee, args, .. } => {
                features.heap_instances = true;
                self.scan_expr(callee, features);
                for arg in args {
                    self.scan_expr(arg, features);
                }
            }
            ast::Expr::First(argument, _) => {
                features.debug_print = true;
                self.scan_expr(argument, features);
            }
            ast::Expr::Call { callee, args, .. } => {
                // The callee of a method call lowers to `->` dispatch, not
                // map access, so only its object participates in discovery.
                if is_print_call(callee) {
                    features.printing = true;
                } else if let ast::Expr::Member {
                    object,
                    computed: false,
                    ..
                } = &**callee
                {
                    self.scan_expr(object, features);
                } else {
                    self.scan_expr(callee, features);
                }
                for arg in args {
                    self.scan_expr(arg, features);
                }
            }
            ast::Expr::Member {
                object,
                property,
                computed,
                ..
            } => {
                if *computed {
                    self.scan_expr(object, features);
                    self.scan_expr(property, features);
                } else {
                    // Dot access on anything but `this` becomes map sugar.
                    if !matches!(**object, ast::Expr::This(_)) {
                        features.objects = true;
                    }
                    self.scan_expr(object, features);
                }
            }
            ast::Expr::Assign(left, right, _) => {
                self.scan_expr(left, features);
                self.scan_expr(right, features);
            }
            ast::Expr::Binary(left, _, right, _) | ast::Expr::Logical(left, _, right, _) => {
                self.scan_expr(left, features);
                self.scan_expr(right, features);
            }
            ast::Expr::Unary(_, argument, _) => self.scan_expr(argument, features),
        }
    }

    fn apply_includes(&mut self, features: Features) {
        if features.strings {
            self.includes.insert("<string>");
        }
        if features.arrays {
            self.includes.insert("<any>");
            self.includes.insert("<vector>");
        }
        if features.objects {
            self.includes.insert("<any>");
            self.includes.insert("<map>");
            self.includes.insert("<string>");
        }
        if features.classes {
            self.includes.insert("<any>");
        }
        if features.heap_instances {
            self.includes.insert("<memory>");
        }
        if features.printing {
            // print_any inspects every boxed shape.
            self.includes.insert("<any>");
            self.includes.insert("<iostream>");
            self.includes.insert("<map>");
            self.includes.insert("<string>");
            self.includes.insert("<vector>");
        }
        if features.debug_print {
            self.includes.insert("<iostream>");
            self.includes.insert("<typeinfo>");
        }
    }

    // ---- emission pass -----------------------------------------------

    fn emit(&mut self, line: &str) {
        if line.is_empty() {
            self.lines.push(String::new());
        } else {
            self.lines.push(format!("{}{}", "  ".repeat(self.indent), line));
        }
    }

    fn emit_print_helper(&mut self) {
        self.emit("void print_any(const std::any& value) {");
        self.emit(r#"  if (value.type() == typeid(int)) { std::cout << std::any_cast<int>(value); }"#);
        self.emit(r#"  else if (value.type() == typeid(bool)) { std::cout << (std::any_cast<bool>(value) ? "true" : "false"); }"#);
        self.emit(r#"  else if (value.type() == typeid(const char*)) { std::cout << "\"" << std::any_cast<const char*>(value) << "\""; }"#);
        self.emit(r#"  else if (value.type() == typeid(std::string)) { std::cout << "\"" << std::any_cast<std::string>(value) << "\""; }"#);
        self.emit(r#"  else if (value.type() == typeid(std::vector<std::any>)) {"#);
        self.emit(r#"    const auto& vec = std::any_cast<const std::vector<std::any>&>(value);"#);
        self.emit(r#"    std::cout << "[";"#);
        self.emit(r#"    for (size_t i = 0; i < vec.size(); ++i) { print_any(vec[i]); if (i < vec.size() - 1) std::cout << ", "; }"#);
        self.emit(r#"    std::cout << "]";"#);
        self.emit(r#"  } else if (value.type() == typeid(std::map<std::string, std::any>)) {"#);
        self.emit(r#"    const auto& map = std::any_cast<const std::map<std::string, std::any>&>(value);"#);
        self.emit(r#"    std::cout << "{";"#);
        self.emit(r#"    size_t i = 0;"#);
        self.emit(r#"    for (const auto& pair : map) { std::cout << "\"" << pair.first << "\": "; print_any(pair.second); if (i < map.size() - 1) std::cout << ", "; i++; }"#);
        self.emit(r#"    std::cout << "}";"#);
        self.emit(r#"  } else { std::cout << "unsupported_type"; }"#);
        self.emit("}");
    }

    fn emit_stmt(&mut self, stmt: &ast::Stmt) -> Result<(), CompileError> {
        match stmt {
            ast::Stmt::VarDecl(decl) => self.emit_var_decl(decl)?,
            ast::Stmt::Expr(expr, _) => self.emit_expr_stmt(expr)?,
            ast::Stmt::Block(block) => self.emit_block(block)?,
            ast::Stmt::If(stmt) => self.emit_if(stmt)?,
            ast::Stmt::While { test, body, .. } => {
                let test_code = self.expr_to_cpp(test)?;
                self.emit(&format!("while ({})", test_code));
                self.emit_block(body)?;
            }
            ast::Stmt::For(stmt) => self.emit_for(stmt)?,
            ast::Stmt::Function(func) => self.emit_function(func)?,
            ast::Stmt::Class(class) => self.emit_class(class)?,
            ast::Stmt::Return { argument, .. } => match argument {
                Some(expr) => {
                    let code = self.expr_to_cpp(expr)?;
                    self.emit(&format!("return {};", code));
                }
                None => self.emit("return 0;"),
            },
        }
        Ok(())
    }

    fn emit_var_decl(&mut self, decl: &ast::VarDecl) -> Result<(), CompileError> {
        // A re-declared name is dropped wholesale, initializer included.
        // Known compatibility hazard; pinned by a regression test.
        if self.declared.contains(&decl.name) {
            return Ok(());
        }

        let value = match &decl.init {
            Some(init) => self.expr_to_cpp(init)?,
            None => "0".to_string(),
        };
        self.emit(&format!("auto {} = {};", decl.name, value));
        self.declared.insert(decl.name.clone());
        Ok(())
    }

    fn emit_expr_stmt(&mut self, expr: &ast::Expr) -> Result<(), CompileError> {
        // console.log(...) is the print built-in, not a real call: one
        // stream write per argument, separated by spaces, newline at the end.
        if let ast::Expr::Call { callee, args, .. } = expr {
            if is_print_call(callee) {
                for (i, arg) in args.iter().enumerate() {
                    let code = self.expr_to_cpp(arg)?;
                    self.emit(&format!("print_any({});", code));
                    if i + 1 < args.len() {
                        self.emit(r#"std::cout << " ";"#);
                    }
                }
                self.emit("std::cout << std::endl;");
                return Ok(());
            }
        }

        // `first <expr>`: bind a fresh temporary, print value and runtime
        // type name. The counter makes repeated compilations byte-identical.
        if let ast::Expr::First(argument, _) = expr {
            let tmp = format!("tmp{}", self.tmp_counter);
            self.tmp_counter += 1;
            let code = self.expr_to_cpp(argument)?;
            self.emit(&format!("auto {} = {};", tmp, code));
            self.emit(&format!(
                r#"std::cout << {} << " (type: " << typeid({}).name() << ")" << std::endl;"#,
                tmp, tmp
            ));
            return Ok(());
        }

        let code = self.expr_to_cpp(expr)?;
        self.emit(&format!("{};", code));
        Ok(())
    }

    fn emit_block(&mut self, block: &ast::Block) -> Result<(), CompileError> {
        self.emit("{");
        self.indent += 1;
        for stmt in &block.body {
            self.emit_stmt(stmt)?;
        }
        self.indent -= 1;
        self.emit("}");
        Ok(())
    }

    fn emit_if(&mut self, stmt: &ast::IfStmt) -> Result<(), CompileError> {
        let test_code = self.expr_to_cpp(&stmt.test)?;
        self.emit(&format!("if ({})", test_code));
        self.emit_block(&stmt.consequent)?;
        match stmt.alternate.as_deref() {
            Some(ast::ElseBranch::ElseIf(else_if)) => {
                self.emit("else");
                self.emit_if(else_if)?;
            }
            Some(ast::ElseBranch::Else(block)) => {
                self.emit("else");
                self.emit_block(block)?;
            }
            None => {}
        }
        Ok(())
    }

    fn emit_for(&mut self, stmt: &ast::ForStmt) -> Result<(), CompileError> {
        let init_code = match &stmt.init {
            // A loop counter gets a narrow int, not the universal holder.
            Some(ast::ForInit::VarDecl(decl)) => {
                let value = match &decl.init {
                    Some(init) => self.expr_to_cpp(init)?,
                    None => "0".to_string(),
                };
                format!("int {} = {}", decl.name, value)
            }
            Some(ast::ForInit::Expr(expr)) => self.expr_to_cpp(expr)?,
            None => String::new(),
        };
        let test_code = match &stmt.test {
            Some(test) => self.expr_to_cpp(test)?,
            None => String::new(),
        };
        let update_code = match &stmt.update {
            Some(update) => self.expr_to_cpp(update)?,
            None => String::new(),
        };

        self.emit(&format!("for ({}; {}; {})", init_code, test_code, update_code));
        self.emit_block(&stmt.body)
    }

    fn emit_function(&mut self, func: &ast::FunctionDecl) -> Result<(), CompileError> {
        let params = func
            .params
            .iter()
            .map(|p| format!("int {}", p))
            .collect::<Vec<_>>()
            .join(", ");
        self.emit(&format!("int {}({})", func.name, params));
        self.emit_block(&func.body)
    }

    fn emit_class(&mut self, class: &ast::ClassDecl) -> Result<(), CompileError> {
        let fields = constructor_fields(class);

        self.emit(&format!("struct {} {{", class.name));
        self.indent += 1;

        for field in &fields {
            self.emit(&format!("std::any {};", field));
        }
        if !fields.is_empty() && !class.body.is_empty() {
            self.emit("");
        }

        for (i, method) in class.body.iter().enumerate() {
            let params = method
                .params
                .iter()
                .map(|p| format!("std::any {}", p))
                .collect::<Vec<_>>()
                .join(", ");

            match method.kind {
                ast::MethodKind::Constructor => {
                    self.emit(&format!("{}({})", class.name, params));
                    self.emit_block(&method.body)?;
                }
                ast::MethodKind::Method => {
                    self.emit(&format!("std::any {}({})", method.key, params));
                    self.emit_method_body(&method.body)?;
                }
            }
            if i + 1 < class.body.len() {
                self.emit("");
            }
        }

        self.indent -= 1;
        self.emit("};");
        Ok(())
    }

    /// Like `emit_block`, but guarantees the method returns a value on
    /// every path that falls off the end.
    fn emit_method_body(&mut self, block: &ast::Block) -> Result<(), CompileError> {
        self.emit("{");
        self.indent += 1;
        for stmt in &block.body {
            self.emit_stmt(stmt)?;
        }
        if !matches!(block.body.last(), Some(ast::Stmt::Return { .. })) {
            self.emit("return std::any{};");
        }
        self.indent -= 1;
        self.emit("}");
        Ok(())
    }

    // ---- expression lowering -------------------------------------------

    /// Recursive expression-to-text synthesis, independent of statement
    /// emission. Every binary/logical/unary/assignment application is
    /// parenthesized so C++ precedence can never regroup the source tree.
    fn expr_to_cpp(&mut self, expr: &ast::Expr) -> Result<String, CompileError> {
        match expr {
            ast::Expr::Ident(name, _) => Ok(name.clone()),
            ast::Expr::Int(value, _) => Ok(value.to_string()),
            ast::Expr::Str(value, _) => Ok(format!("std::string(\"{}\")", escape_cpp(value))),
            ast::Expr::Bool(value, _) => Ok(if *value { "true" } else { "false" }.to_string()),
            ast::Expr::Assign(left, right, _) => {
                let left_code = self.expr_to_cpp(left)?;
                let right_code = self.expr_to_cpp(right)?;
                Ok(format!("({} = {})", left_code, right_code))
            }
            ast::Expr::Binary(left, op, right, _) => {
                let left_code = self.expr_to_cpp(left)?;
                let right_code = self.expr_to_cpp(right)?;
                Ok(format!("({} {} {})", left_code, op, right_code))
            }
            ast::Expr::Logical(left, op, right, _) => {
                let left_code = self.expr_to_cpp(left)?;
                let right_code = self.expr_to_cpp(right)?;
                Ok(format!("({} {} {})", left_code, op, right_code))
            }
            ast::Expr::Unary(op, argument, _) => {
                let argument_code = self.expr_to_cpp(argument)?;
                Ok(format!("({}{})", op, argument_code))
            }
            ast::Expr::Call { callee, args, .. } => {
                let args_code = self.args_to_cpp(args)?;
                // A call through dot access dispatches through the handle.
                if let ast::Expr::Member {
                    object,
                    property,
                    computed: false,
                    ..
                } = &**callee
                {
                    let name = self.member_name(property)?;
                    let object_code = if matches!(**object, ast::Expr::This(_)) {
                        "this".to_string()
                    } else {
                        self.expr_to_cpp(object)?
                    };
                    return Ok(format!("{}->{}({})", object_code, name, args_code));
                }
                let callee_code = self.expr_to_cpp(callee)?;
                Ok(format!("{}({})", callee_code, args_code))
            }
            ast::Expr::Member {
                object,
                property,
                computed,
                ..
            } => {
                if *computed {
                    let object_code = self.expr_to_cpp(object)?;
                    let property_code = self.expr_to_cpp(property)?;
                    Ok(format!("{}[{}]", object_code, property_code))
                } else {
                    let name = self.member_name(property)?;
                    if matches!(**object, ast::Expr::This(_)) {
                        Ok(format!("this->{}", name))
                    } else {
                        // Dot notation on plain values is sugar over the
                        // ordered string-keyed map.
                        let object_code = self.expr_to_cpp(object)?;
                        Ok(format!(
                            "std::any_cast<std::map<std::string, std::any>&>({})[\"{}\"]",
                            object_code, name
                        ))
                    }
                }
            }
            ast::Expr::Array(elements, _) => {
                let elements_code = self.args_to_cpp(elements)?;
                Ok(format!("std::vector<std::any>{{{}}}", elements_code))
            }
            ast::Expr::Object(properties, _) => {
                let mut pairs = Vec::new();
                for property in properties {
                    let value_code = self.expr_to_cpp(&property.value)?;
                    pairs.push(format!(
                        "{{\"{}\", {}}}",
                        escape_cpp(property.key.as_str()),
                        value_code
                    ));
                }
                Ok(format!(
                    "std::map<std::string, std::any>{{{}}}",
                    pairs.join(", ")
                ))
            }
            ast::Expr::New { callee, args, .. } => {
                let callee_code = self.expr_to_cpp(callee)?;
                let args_code = self.args_to_cpp(args)?;
                Ok(format!("std::make_shared<{}>({})", callee_code, args_code))
            }
            // `this` only has meaning through member access; anywhere else
            // there is no value representation for it.
            ast::Expr::This(span) => Err(CompileError::UnsupportedExpression {
                kind: expr.kind(),
                span: Some(*span),
                file_id: self.file_id,
            }),
            // The debug-print construct is statement-only.
            ast::Expr::First(_, span) => Err(CompileError::UnsupportedExpression {
                kind: expr.kind(),
                span: Some(*span),
                file_id: self.file_id,
            }),
        }
    }

    fn args_to_cpp(&mut self, args: &[ast::Expr]) -> Result<String, CompileError> {
        let mut codes = Vec::new();
        for arg in args {
            codes.push(self.expr_to_cpp(arg)?);
        }
        Ok(codes.join(", "))
    }

    fn member_name(&self, property: &ast::Expr) -> Result<String, CompileError> {
        match property {
            ast::Expr::Ident(name, _) => Ok(name.clone()),
            other => Err(CompileError::CodegenError {
                message: "non-computed member property must be an identifier".to_string(),
                span: Some(other.span()),
                file_id: self.file_id,
            }),
        }
    }
}

/// `console.log` as a callee, checked structurally: dot access whose object
/// is the identifier `console` and whose property is `log`.
fn is_print_call(callee: &ast::Expr) -> bool {
    if let ast::Expr::Member {
        object,
        property,
        computed: false,
        ..
    } = callee
    {
        if let (ast::Expr::Ident(object_name, _), ast::Expr::Ident(property_name, _)) =
            (&**object, &**property)
        {
            return object_name == "console" && property_name == "log";
        }
    }
    false
}

/// Field layout is not declared in the source: it is inferred from every
/// `this.<name> = ...` assignment anywhere inside the constructor body,
/// distinct names in first-seen order.
fn constructor_fields(class: &ast::ClassDecl) -> Vec<String> {
    let mut fields = Vec::new();
    let Some(ctor) = class
        .body
        .iter()
        .find(|m| m.kind == ast::MethodKind::Constructor)
    else {
        return fields;
    };

    for stmt in &ctor.body.body {
        ast::walk_stmt(stmt, &mut |expr| {
            if let ast::Expr::Assign(left, _, _) = expr {
                if let ast::Expr::Member {
                    object,
                    property,
                    computed: false,
                    ..
                } = &**left
                {
                    if matches!(**object, ast::Expr::This(_)) {
                        if let ast::Expr::Ident(name, _) = &**property {
                            if !fields.iter().any(|f| f == name) {
                                fields.push(name.clone());
                            }
                        }
                    }
                }
            }
        });
    }

    fields
}

fn escape_cpp(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('\n', "\\n")
        .replace('"', "\\\"")
}
