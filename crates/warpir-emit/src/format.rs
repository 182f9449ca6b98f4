use warpir_core::{
    BuiltInInputKind, BuiltInOutputKind, ConstVal, DerivativeDirection, Field, OffloadKind, Stmt,
    StmtId, StmtKind, Texture, TripCount,
};

/// Stateless formatting of IR leaves. Every statement prints as
/// `%id = opcode payload : type`; the type suffix is present only for
/// value-producing statements and only when the caller asks for types.
pub struct IrFormatter;

impl IrFormatter {
    pub fn format_const(value: ConstVal) -> String {
        value.to_string()
    }

    pub fn format_field(field: &Field) -> String {
        let shape: Vec<String> = field.shape.iter().map(|d| d.to_string()).collect();
        if field.offset_in_tree == 0 {
            format!(
                "field(tree {}, [{}], {})",
                field.tree_id,
                shape.join(", "),
                field.element_type
            )
        } else {
            format!(
                "field(tree {}, offset {}, [{}], {})",
                field.tree_id,
                field.offset_in_tree,
                shape.join(", "),
                field.element_type
            )
        }
    }

    pub fn format_texture(texture: &Texture) -> String {
        if texture.is_depth {
            format!("texture({}, {}d, depth)", texture.id, texture.num_dimensions)
        } else {
            format!("texture({}, {}d)", texture.id, texture.num_dimensions)
        }
    }

    pub fn format_trip_count(trip_count: TripCount) -> String {
        match trip_count {
            TripCount::Constant(n) => n.to_string(),
            TripCount::TemporarySlot(slot) => format!("slot {}", slot),
        }
    }

    pub fn format_module_kind(kind: OffloadKind) -> String {
        match kind {
            OffloadKind::Compute { trip_count } => {
                format!("compute({})", Self::format_trip_count(trip_count))
            }
            other => other.name().to_string(),
        }
    }

    pub fn format_operands(ids: &[StmtId]) -> String {
        let parts: Vec<String> = ids.iter().map(|id| id.to_string()).collect();
        parts.join(", ")
    }

    pub fn format_builtin_output(kind: BuiltInOutputKind) -> &'static str {
        match kind {
            BuiltInOutputKind::Position => "position",
            BuiltInOutputKind::Color => "color",
            BuiltInOutputKind::FragDepth => "frag_depth",
        }
    }

    pub fn format_builtin_input(kind: BuiltInInputKind) -> &'static str {
        match kind {
            BuiltInInputKind::VertexIndex => "vertex_index",
            BuiltInInputKind::InstanceIndex => "instance_index",
            BuiltInInputKind::FragCoord => "frag_coord",
        }
    }

    /// One statement as a line of text, without indentation. For statements
    /// that own nested blocks this is the header only; the caller appends
    /// braces and recurses.
    pub fn format_stmt(stmt: &Stmt, include_types: bool) -> String {
        let mut line = format!("{} = {}", stmt.id, stmt.opcode());
        let payload = Self::format_payload(stmt);
        if !payload.is_empty() {
            line.push(' ');
            line.push_str(&payload);
        }
        if include_types {
            if let Some(prim) = stmt.ret {
                line.push_str(&format!(" : {}", prim));
            }
        }
        line
    }

    fn format_payload(stmt: &Stmt) -> String {
        match &stmt.kind {
            StmtKind::Const { value } => Self::format_const(*value),
            StmtKind::RangeFor {
                range,
                strictly_serialized,
                is_parallel,
                ..
            } => {
                let mut text = range.to_string();
                if *is_parallel {
                    text.push_str(" parallel");
                }
                if *strictly_serialized {
                    text.push_str(" serialized");
                }
                text
            }
            StmtKind::LoopIndex { loop_stmt } => match loop_stmt {
                Some(id) => id.to_string(),
                None => String::new(),
            },
            StmtKind::If { cond, .. } => cond.to_string(),
            StmtKind::While { .. }
            | StmtKind::WhileControl
            | StmtKind::Continue
            | StmtKind::VertexFor { .. }
            | StmtKind::FragmentFor { .. }
            | StmtKind::Alloca
            | StmtKind::Discard
            | StmtKind::Rand => String::new(),
            StmtKind::LocalLoad { ptr }
            | StmtKind::GlobalLoad { ptr }
            | StmtKind::GlobalTemporaryLoad { ptr }
            | StmtKind::AtomicLoad { ptr } => ptr.to_string(),
            StmtKind::LocalStore { ptr, value }
            | StmtKind::GlobalStore { ptr, value }
            | StmtKind::GlobalTemporaryStore { ptr, value }
            | StmtKind::AtomicStore { ptr, value } => format!("{}, {}", ptr, value),
            StmtKind::GlobalPtr {
                field,
                indices,
                element_offset,
            } => {
                let mut text = format!(
                    "{}[{}]",
                    Self::format_field(field),
                    Self::format_operands(indices)
                );
                if *element_offset > 0 {
                    text.push_str(&format!(" element {}", element_offset));
                }
                text
            }
            StmtKind::GlobalTemporary { slot } => format!("slot {}", slot),
            StmtKind::AtomicOp { dest, operand, op } => {
                format!("{} {}, {}", op, dest, operand)
            }
            StmtKind::BinaryOp { left, right, op } => {
                format!("{} {}, {}", op, left, right)
            }
            StmtKind::UnaryOp { operand, op } => format!("{} {}", op, operand),
            StmtKind::VertexInput { location } => format!("location {}", location),
            StmtKind::VertexOutput { location, value } => {
                format!("location {}, {}", location, value)
            }
            StmtKind::FragmentInput { location } => format!("location {}", location),
            StmtKind::BuiltInOutput {
                kind,
                location,
                values,
            } => {
                let mut text = Self::format_builtin_output(*kind).to_string();
                if let Some(loc) = location {
                    text.push_str(&format!(" {}", loc));
                }
                if !values.is_empty() {
                    text.push_str(&format!(", {}", Self::format_operands(values)));
                }
                text
            }
            StmtKind::BuiltInInput { kind } => Self::format_builtin_input(*kind).to_string(),
            StmtKind::FragmentDerivative { direction, operand } => {
                let axis = match direction {
                    DerivativeDirection::X => "x",
                    DerivativeDirection::Y => "y",
                };
                format!("{} {}", axis, operand)
            }
            StmtKind::TextureFunction {
                kind,
                texture,
                args,
            } => {
                let mut text = format!("{} {}", kind.name(), Self::format_texture(texture));
                if !args.is_empty() {
                    text.push_str(&format!(", {}", Self::format_operands(args)));
                }
                text
            }
            StmtKind::ArgLoad { arg_index } => arg_index.to_string(),
            StmtKind::Return { values } => Self::format_operands(values),
            StmtKind::CompositeExtract { composite, index } => {
                format!("{}, {}", composite, index)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use warpir_core::{AtomicOp, BinaryOp, PrimitiveType, Type};

    fn stmt(id: u32, ret: Option<PrimitiveType>, kind: StmtKind) -> Stmt {
        Stmt::new(StmtId(id), ret, kind)
    }

    #[test]
    fn test_format_field() {
        let field = Field::new(0, 0, vec![16], Type::Scalar(PrimitiveType::F32));
        assert_eq!(IrFormatter::format_field(&field), "field(tree 0, [16], f32)");

        let offset = Field::new(2, 4, vec![8, 8], Type::Vector(PrimitiveType::F32, 2));
        assert_eq!(
            IrFormatter::format_field(&offset),
            "field(tree 2, offset 4, [8, 8], vec2<f32>)"
        );
    }

    #[test]
    fn test_format_texture() {
        assert_eq!(
            IrFormatter::format_texture(&Texture::new(0, 2, false)),
            "texture(0, 2d)"
        );
        assert_eq!(
            IrFormatter::format_texture(&Texture::new(1, 2, true)),
            "texture(1, 2d, depth)"
        );
    }

    #[test]
    fn test_format_module_kind() {
        assert_eq!(IrFormatter::format_module_kind(OffloadKind::Serial), "serial");
        assert_eq!(
            IrFormatter::format_module_kind(OffloadKind::Compute {
                trip_count: TripCount::Constant(64)
            }),
            "compute(64)"
        );
        assert_eq!(
            IrFormatter::format_module_kind(OffloadKind::Compute {
                trip_count: TripCount::TemporarySlot(1)
            }),
            "compute(slot 1)"
        );
    }

    #[test]
    fn test_format_binary_stmt() {
        let s = stmt(
            3,
            Some(PrimitiveType::F32),
            StmtKind::BinaryOp {
                left: StmtId(1),
                right: StmtId(2),
                op: BinaryOp::Add,
            },
        );
        assert_eq!(IrFormatter::format_stmt(&s, true), "%3 = binary add %1, %2 : f32");
        assert_eq!(IrFormatter::format_stmt(&s, false), "%3 = binary add %1, %2");
    }

    #[test]
    fn test_format_store_has_no_type_suffix() {
        let s = stmt(
            4,
            None,
            StmtKind::GlobalStore {
                ptr: StmtId(2),
                value: StmtId(3),
            },
        );
        assert_eq!(IrFormatter::format_stmt(&s, true), "%4 = global_store %2, %3");
    }

    #[test]
    fn test_format_global_ptr() {
        let field = Field::new(1, 0, vec![16], Type::Vector(PrimitiveType::F32, 2));
        let s = stmt(
            2,
            Some(PrimitiveType::F32),
            StmtKind::GlobalPtr {
                field,
                indices: vec![StmtId(1)],
                element_offset: 1,
            },
        );
        assert_eq!(
            IrFormatter::format_stmt(&s, true),
            "%2 = global_ptr field(tree 1, [16], vec2<f32>)[%1] element 1 : f32"
        );
    }

    #[test]
    fn test_format_atomic() {
        let s = stmt(
            5,
            Some(PrimitiveType::I32),
            StmtKind::AtomicOp {
                dest: StmtId(2),
                operand: StmtId(4),
                op: AtomicOp::Add,
            },
        );
        assert_eq!(IrFormatter::format_stmt(&s, true), "%5 = atomic add %2, %4 : i32");
    }

    #[test]
    fn test_format_builtin_output() {
        let s = stmt(
            7,
            None,
            StmtKind::BuiltInOutput {
                kind: BuiltInOutputKind::Color,
                location: Some(0),
                values: vec![StmtId(3), StmtId(4), StmtId(5), StmtId(6)],
            },
        );
        assert_eq!(
            IrFormatter::format_stmt(&s, true),
            "%7 = builtin_output color 0, %3, %4, %5, %6"
        );
    }

    #[test]
    fn test_format_bare_return() {
        let s = stmt(0, None, StmtKind::Return { values: vec![] });
        assert_eq!(IrFormatter::format_stmt(&s, true), "%0 = return");
    }

    #[test]
    fn test_format_loop_header() {
        let s = stmt(
            1,
            None,
            StmtKind::RangeFor {
                range: StmtId(0),
                strictly_serialized: false,
                is_parallel: true,
                body: warpir_core::Block::new(),
            },
        );
        assert_eq!(IrFormatter::format_stmt(&s, true), "%1 = range_for %0 parallel");
    }
}
