//! Package qualification and Rust rendering of types.

use ironmeta_schema::{ChanDir, PackageId, Shape, TypeGraph, TypeId};

/// Decides how a package is referenced from generated code.
///
/// Types from the home package are unqualified. Other packages are referenced
/// by name, or by full path when another package in the graph shares that
/// name.
#[derive(Debug, Clone, Copy)]
pub struct Qualifier<'g> {
    graph: &'g TypeGraph,
    home: Option<PackageId>,
}

impl<'g> Qualifier<'g> {
    /// Creates a qualifier for code living in `home`.
    #[must_use]
    pub fn new(graph: &'g TypeGraph, home: Option<PackageId>) -> Self {
        Self { graph, home }
    }

    /// Returns the home package.
    #[must_use]
    pub fn home(&self) -> Option<PackageId> {
        self.home
    }

    /// Returns the prefix used for items of `package`, or `None` for the
    /// home package.
    #[must_use]
    pub fn prefix(&self, package: PackageId) -> Option<String> {
        if self.home == Some(package) {
            return None;
        }
        let info = self.graph.package_info(package);
        let ambiguous = self
            .graph
            .packages()
            .any(|(id, other)| id != package && other.name == info.name);
        if ambiguous {
            Some(info.path.clone())
        } else {
            Some(info.name.clone())
        }
    }

    /// Renders `ty` as Rust source.
    #[must_use]
    pub fn type_string(&self, ty: TypeId) -> String {
        let mut out = String::new();
        self.write_type(&mut out, ty);
        out
    }

    fn write_type(&self, out: &mut String, ty: TypeId) {
        let Some(shape) = self.graph.get(ty) else {
            out.push('_');
            return;
        };
        match shape {
            Shape::Basic(kind) => out.push_str(kind.rust_type()),
            Shape::Pointer(elem) => self.write_generic(out, "Box", &[*elem]),
            Shape::Slice(elem) => self.write_generic(out, "Vec", &[*elem]),
            Shape::Array { len, elem } => {
                out.push('[');
                self.write_type(out, *elem);
                out.push_str(&format!("; {len}]"));
            }
            Shape::Map { key, value } => {
                self.write_generic(out, "::std::collections::HashMap", &[*key, *value]);
            }
            Shape::Chan { dir, elem } => match dir {
                ChanDir::Send => self.write_generic(out, "::std::sync::mpsc::Sender", &[*elem]),
                ChanDir::Recv => self.write_generic(out, "::std::sync::mpsc::Receiver", &[*elem]),
                ChanDir::Both => {
                    out.push('(');
                    self.write_generic(out, "::std::sync::mpsc::Sender", &[*elem]);
                    out.push_str(", ");
                    self.write_generic(out, "::std::sync::mpsc::Receiver", &[*elem]);
                    out.push(')');
                }
            },
            Shape::Signature(sig) => {
                out.push_str("fn(");
                let last = sig.params.len().saturating_sub(1);
                for (i, param) in sig.params.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    match self.graph.get(*param) {
                        Some(Shape::Slice(elem)) if sig.variadic && i == last => {
                            out.push_str("&[");
                            self.write_type(out, *elem);
                            out.push(']');
                        }
                        _ => self.write_type(out, *param),
                    }
                }
                out.push(')');
                match sig.results.as_slice() {
                    [] => {}
                    [single] => {
                        out.push_str(" -> ");
                        self.write_type(out, *single);
                    }
                    many => {
                        out.push_str(" -> ");
                        self.write_tuple(out, many.iter().copied());
                    }
                }
            }
            Shape::Struct(body) => self.write_tuple(out, body.fields.iter().map(|f| f.ty)),
            Shape::Interface(_) => out.push_str("Box<dyn ::std::any::Any>"),
            Shape::Named(named) => {
                if let Some(prefix) = named.package.and_then(|p| self.prefix(p)) {
                    out.push_str(&prefix);
                    out.push_str("::");
                }
                out.push_str(&named.name);
            }
        }
    }

    fn write_generic(&self, out: &mut String, name: &str, args: &[TypeId]) {
        out.push_str(name);
        out.push('<');
        for (i, arg) in args.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            self.write_type(out, *arg);
        }
        out.push('>');
    }

    fn write_tuple(&self, out: &mut String, items: impl ExactSizeIterator<Item = TypeId>) {
        let single = items.len() == 1;
        out.push('(');
        for (i, item) in items.enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            self.write_type(out, item);
        }
        if single {
            out.push(',');
        }
        out.push(')');
    }
}

/// Renders `ty` as Rust source as seen from `home`.
#[must_use]
pub fn type_string(graph: &TypeGraph, ty: TypeId, home: Option<PackageId>) -> String {
    Qualifier::new(graph, home).type_string(ty)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ironmeta_schema::{BasicKind, Method, StructField};

    struct Fixture {
        graph: TypeGraph,
        home: PackageId,
        point: TypeId,
        time: TypeId,
    }

    fn fixture() -> Fixture {
        let mut graph = TypeGraph::new();
        let home = graph.package("crate::geo", "geo");
        let std_time = graph.package("std::time", "time");
        let f64_ty = graph.basic(BasicKind::Float64);
        let u64_ty = graph.basic(BasicKind::Uint64);
        let point_body = graph.struct_type(vec![
            StructField::new("X", f64_ty),
            StructField::new("Y", f64_ty),
        ]);
        let point = graph.declare("Point", Some(home), point_body).expect("declare");
        let time = graph.declare("Duration", Some(std_time), u64_ty).expect("declare");
        Fixture {
            graph,
            home,
            point,
            time,
        }
    }

    #[test]
    fn test_home_package_is_unqualified() {
        let fx = fixture();
        let q = Qualifier::new(&fx.graph, Some(fx.home));
        assert_eq!(q.type_string(fx.point), "Point");
        assert_eq!(q.type_string(fx.time), "time::Duration");

        let outside = Qualifier::new(&fx.graph, None);
        assert_eq!(outside.type_string(fx.point), "geo::Point");
    }

    #[test]
    fn test_ambiguous_package_name_uses_path() {
        let mut fx = fixture();
        let other = fx.graph.package("vendor::time", "time");
        let bool_ty = fx.graph.basic(BasicKind::Bool);
        let flag = fx.graph.declare("Flag", Some(other), bool_ty).expect("declare");
        let q = Qualifier::new(&fx.graph, Some(fx.home));
        assert_eq!(q.type_string(fx.time), "std::time::Duration");
        assert_eq!(q.type_string(flag), "vendor::time::Flag");
    }

    #[test]
    fn test_composite_rendering() {
        let mut fx = fixture();
        let g = &mut fx.graph;
        let string = g.basic(BasicKind::String);
        let int = g.basic(BasicKind::Int32);
        let ptr = g.pointer(fx.point);
        let slice = g.slice(ptr);
        let array = g.array(4, int);
        let map = g.map(string, fx.time);
        let send = g.chan(ChanDir::Send, int);
        let both = g.chan(ChanDir::Both, int);
        let ints = g.slice(int);
        let sig = g.signature(vec![string, ints], vec![int, string], true);
        let unit_sig = g.signature(Vec::new(), Vec::new(), false);
        let tuple = g.struct_type(vec![StructField::new("a", int)]);
        let any = g.interface(Vec::<Method>::new());

        let q = Qualifier::new(&fx.graph, Some(fx.home));
        assert_eq!(q.type_string(slice), "Vec<Box<Point>>");
        assert_eq!(q.type_string(array), "[i32; 4]");
        assert_eq!(
            q.type_string(map),
            "::std::collections::HashMap<String, time::Duration>"
        );
        assert_eq!(q.type_string(send), "::std::sync::mpsc::Sender<i32>");
        assert_eq!(
            q.type_string(both),
            "(::std::sync::mpsc::Sender<i32>, ::std::sync::mpsc::Receiver<i32>)"
        );
        assert_eq!(q.type_string(sig), "fn(String, &[i32]) -> (i32, String)");
        assert_eq!(q.type_string(unit_sig), "fn()");
        assert_eq!(q.type_string(tuple), "(i32,)");
        assert_eq!(q.type_string(any), "Box<dyn ::std::any::Any>");
    }
}
