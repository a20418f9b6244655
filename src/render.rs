//! Scaffold rendering: one Go test function per declaration.

use std::collections::{BTreeSet, HashSet};

use serde::Serialize;

use crate::model::{Declaration, Parameter, Receiver};
use crate::resolve::AliasTable;
use crate::types::is_comparable;
use crate::util::{capitalize, strip_non_alnum};

/// Shape of the generated test functions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScaffoldStyle {
    /// One `t.Run` case with zero-valued locals.
    #[default]
    Plain,
    /// An empty case table and a loop over it.
    Table,
}

/// What a declaration is rendered against.
pub struct RenderContext<'a> {
    pub home: &'a str,
    pub aliases: &'a AliasTable,
    /// Types declared in `home`; locals must not shadow them.
    pub local_types: &'a BTreeSet<String>,
    pub style: ScaffoldStyle,
}

/// One rendered test function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestFunc {
    pub name: String,
    pub source: String,
    pub uses_reflect: bool,
}

/// `Test` + receiver short name + declaration name, each capitalized.
pub fn test_name(decl: &Declaration) -> String {
    let mut name = String::from("Test");
    if let Some(recv) = &decl.receiver {
        name.push_str(&capitalize(&strip_non_alnum(&recv.simplified)));
    }
    name.push_str(&capitalize(&decl.name));
    name
}

/// Render `decl` as a test function called `name`.
pub fn render_test(decl: &Declaration, name: &str, ctx: &RenderContext) -> TestFunc {
    let locals = local_names(decl, ctx);
    let mut w = Writer::default();

    w.open(format!("func {name}(t *testing.T) {{"));
    let uses_reflect = match ctx.style {
        ScaffoldStyle::Plain => {
            w.open(format!("t.Run(\"{name}_0\", func(t *testing.T) {{"));
            write_not_implemented(&mut w);
            w.blank();
            write_receiver(&mut w, decl.receiver.as_ref(), ctx);
            for (param, local) in decl.params.iter().zip(&locals) {
                w.line(format!("var {local} {}", param.simplified));
            }
            let uses_reflect = write_call(&mut w, decl, &call_args(&decl.params, &locals, ""));
            w.close("})");
            uses_reflect
        }
        ScaffoldStyle::Table => {
            w.open("tests := []struct {");
            w.line("testName string");
            for (param, local) in decl.params.iter().zip(&locals) {
                w.line(format!("{local} {}", param.simplified));
            }
            w.reopen("}{");
            w.line("// put your test cases here");
            w.close("}");
            w.blank();
            write_not_implemented(&mut w);
            w.blank();
            w.open("for _, tt := range tests {");
            w.open("t.Run(tt.testName, func(t *testing.T) {");
            write_receiver(&mut w, decl.receiver.as_ref(), ctx);
            let uses_reflect = write_call(&mut w, decl, &call_args(&decl.params, &locals, "tt."));
            w.close("})");
            w.close("}");
            uses_reflect
        }
    };
    w.close("}");

    TestFunc {
        name: name.to_string(),
        source: w.out,
        uses_reflect,
    }
}

fn write_not_implemented(w: &mut Writer) {
    w.line("// delete this after your implementation");
    w.line("t.Fatalf(\"test not implemented\")");
}

/// The receiver local holds the zero value of the base type, so pointer
/// receiver methods are callable on it.
fn write_receiver(w: &mut Writer, recv: Option<&Receiver>, ctx: &RenderContext) {
    if let Some(recv) = recv {
        let base = recv.ty.deref().simplified_name_with(ctx.home, ctx.aliases);
        w.line(format!("var receiver {base}"));
    }
}

/// Emit the call and one assertion per result. Returns whether
/// `reflect.DeepEqual` was needed.
fn write_call(w: &mut Writer, decl: &Declaration, args: &str) -> bool {
    let call = match &decl.receiver {
        Some(_) => format!("receiver.{}({args})", decl.name),
        None => format!("{}({args})", decl.name),
    };
    if decl.results.is_empty() {
        w.line(call);
        return false;
    }

    let captured: Vec<String> = (0..decl.results.len()).map(|i| format!("result{i}")).collect();
    w.line(format!("{} := {call}", captured.join(", ")));

    let mut uses_reflect = false;
    for (i, result) in decl.results.iter().enumerate() {
        w.blank();
        w.line(format!("var expect{i} {}", result.simplified));
        if is_comparable(&result.ty) {
            w.open(format!("if result{i} != expect{i} {{"));
        } else {
            uses_reflect = true;
            w.open(format!("if !reflect.DeepEqual(result{i}, expect{i}) {{"));
        }
        w.line(format!("t.Errorf(\"expected %v, got %v\", expect{i}, result{i})"));
        w.close("}");
    }
    uses_reflect
}

fn call_args(params: &[Parameter], locals: &[String], prefix: &str) -> String {
    params
        .iter()
        .zip(locals)
        .map(|(param, local)| {
            if param.variadic {
                format!("{prefix}{local}...")
            } else {
                format!("{prefix}{local}")
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Identifiers the scaffold itself declares or imports.
fn is_scaffold_ident(name: &str) -> bool {
    matches!(
        name,
        "t" | "tt" | "tests" | "receiver" | "testName" | "testing" | "reflect"
    ) || is_numbered(name, "result")
        || is_numbered(name, "expect")
}

fn is_numbered(name: &str, prefix: &str) -> bool {
    name.strip_prefix(prefix)
        .is_some_and(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()))
}

/// Local (and table field) name for each parameter. Names that would shadow
/// a scaffold identifier, an import, a package type or the called
/// declaration get an `Arg` suffix.
fn local_names(decl: &Declaration, ctx: &RenderContext) -> Vec<String> {
    let mut used: HashSet<String> = decl.params.iter().map(|p| p.name.clone()).collect();
    used.extend(ctx.local_types.iter().cloned());
    used.insert(decl.name.clone());
    decl.params
        .iter()
        .map(|param| {
            let shadows = is_scaffold_ident(&param.name)
                || ctx.aliases.is_alias(&param.name)
                || ctx.local_types.contains(&param.name)
                || param.name == decl.name;
            if !shadows {
                return param.name.clone();
            }
            let mut local = format!("{}Arg", param.name);
            while used.contains(&local) {
                local.push_str("Arg");
            }
            used.insert(local.clone());
            local
        })
        .collect()
}

/// Tab-indented line buffer.
#[derive(Default)]
struct Writer {
    out: String,
    depth: usize,
}

impl Writer {
    fn line(&mut self, text: impl AsRef<str>) {
        for _ in 0..self.depth {
            self.out.push('\t');
        }
        self.out.push_str(text.as_ref());
        self.out.push('\n');
    }

    fn blank(&mut self) {
        self.out.push('\n');
    }

    fn open(&mut self, text: impl AsRef<str>) {
        self.line(text);
        self.depth += 1;
    }

    fn close(&mut self, text: impl AsRef<str>) {
        self.depth = self.depth.saturating_sub(1);
        self.line(text);
    }

    /// A line that closes one block and opens the next, like `}{`.
    fn reopen(&mut self, text: impl AsRef<str>) {
        self.close(text);
        self.depth += 1;
    }
}
