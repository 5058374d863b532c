// Canonical type descriptors. All descriptors for one compilation unit
// live in a TypeTable vector and refer to each other by TypeId index —
// method tables and symbol entries store TypeIds, never owning references,
// which keeps the struct <-> method-table relationship acyclic.

use std::collections::HashMap;

use asthra_ast::{PrimitiveType, Visibility};

/// Index into a TypeTable. Equality of interned ids is type equality for
/// primitives and structurally-interned composites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeId(pub u32);

#[derive(Debug, Clone, PartialEq)]
pub struct TypeDescriptor {
    pub kind: TypeKind,
    pub size: usize,
    pub align: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypeKind {
    Primitive(PrimitiveType),
    Struct(StructType),
    Enum(EnumType),
    Slice { element: TypeId },
    Array { element: TypeId, length: usize },
    Pointer { pointee: TypeId, is_mutable: bool },
    Option { value: TypeId },
    Result { ok: TypeId, err: TypeId },
    Tuple { elements: Vec<TypeId>, offsets: Vec<usize> },
    Function(FunctionType),
    TaskHandle { result: TypeId },
    GenericInstance { base: TypeId, args: Vec<TypeId> },
    /// A type parameter inside a generic declaration body (`T` in
    /// `struct Vec<T> { items: []T }`).
    TypeParam { name: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructType {
    pub name: String,
    pub type_params: Vec<String>,
    pub fields: Vec<FieldInfo>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldInfo {
    pub name: String,
    pub ty: TypeId,
    pub offset: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumType {
    pub name: String,
    pub type_params: Vec<String>,
    pub variants: Vec<VariantInfo>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VariantInfo {
    pub name: String,
    pub payload: Option<TypeId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionType {
    pub params: Vec<TypeId>,
    pub return_type: TypeId,
    pub is_extern: bool,
    pub extern_abi: Option<String>,
}

/// Method table entry; the owning struct is identified by TypeId on the
/// table itself.
#[derive(Debug, Clone)]
pub struct MethodInfo {
    pub name: String,
    pub ty: TypeId,
    pub visibility: Visibility,
    pub is_instance_method: bool,
}

/// Structural interning key for non-nominal composites.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum InternKey {
    Primitive(PrimitiveType),
    Slice(TypeId),
    Array(TypeId, usize),
    Pointer(TypeId, bool),
    Option(TypeId),
    Result(TypeId, TypeId),
    Tuple(Vec<TypeId>),
    Function(Vec<TypeId>, TypeId, bool),
    TaskHandle(TypeId),
    GenericInstance(TypeId, Vec<TypeId>),
    TypeParam(String),
}

fn intern_key(kind: &TypeKind) -> Option<InternKey> {
    match kind {
        TypeKind::Primitive(p) => Some(InternKey::Primitive(*p)),
        TypeKind::Slice { element } => Some(InternKey::Slice(*element)),
        TypeKind::Array { element, length } => Some(InternKey::Array(*element, *length)),
        TypeKind::Pointer {
            pointee,
            is_mutable,
        } => Some(InternKey::Pointer(*pointee, *is_mutable)),
        TypeKind::Option { value } => Some(InternKey::Option(*value)),
        TypeKind::Result { ok, err } => Some(InternKey::Result(*ok, *err)),
        TypeKind::Tuple { elements, .. } => Some(InternKey::Tuple(elements.clone())),
        TypeKind::Function(f) => Some(InternKey::Function(
            f.params.clone(),
            f.return_type,
            f.is_extern,
        )),
        TypeKind::TaskHandle { result } => Some(InternKey::TaskHandle(*result)),
        TypeKind::GenericInstance { base, args } => {
            Some(InternKey::GenericInstance(*base, args.clone()))
        }
        TypeKind::TypeParam { name } => Some(InternKey::TypeParam(name.clone())),
        TypeKind::Struct(_) | TypeKind::Enum(_) => None,
    }
}

const POINTER_SIZE: usize = 8;

/// Per-unit arena of type descriptors with structural interning for
/// composites and nominal entries for struct/enum declarations.
#[derive(Debug, Default)]
pub struct TypeTable {
    types: Vec<TypeDescriptor>,
    interned: HashMap<InternKey, TypeId>,
    methods: HashMap<TypeId, HashMap<String, MethodInfo>>,
}

impl TypeTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: TypeId) -> &TypeDescriptor {
        &self.types[id.0 as usize]
    }

    pub fn kind(&self, id: TypeId) -> &TypeKind {
        &self.get(id).kind
    }

    pub fn primitive(&mut self, primitive: PrimitiveType) -> TypeId {
        self.intern(TypeKind::Primitive(primitive))
    }

    pub fn is_primitive(&self, id: TypeId, primitive: PrimitiveType) -> bool {
        matches!(self.kind(id), TypeKind::Primitive(p) if *p == primitive)
    }

    pub fn is_never(&self, id: TypeId) -> bool {
        self.is_primitive(id, PrimitiveType::Never)
    }

    pub fn is_integer(&self, id: TypeId) -> bool {
        matches!(self.kind(id), TypeKind::Primitive(p) if p.is_integer())
    }

    pub fn is_numeric(&self, id: TypeId) -> bool {
        matches!(self.kind(id), TypeKind::Primitive(p) if p.is_numeric())
    }

    /// Intern a composite or primitive kind: structurally identical kinds
    /// share one descriptor, so TypeId equality is type equality.
    pub fn intern(&mut self, kind: TypeKind) -> TypeId {
        if let Some(key) = intern_key(&kind) {
            if let Some(&id) = self.interned.get(&key) {
                return id;
            }
            let (size, align) = self.layout_of(&kind);
            let id = self.push(TypeDescriptor { kind, size, align });
            self.interned.insert(key, id);
            id
        } else {
            let (size, align) = self.layout_of(&kind);
            self.push(TypeDescriptor { kind, size, align })
        }
    }

    /// Reserve a nominal struct entry; fields are filled in once resolved
    /// (allows self-referential fields through pointers).
    pub fn declare_struct(&mut self, name: &str, type_params: Vec<String>) -> TypeId {
        self.push(TypeDescriptor {
            kind: TypeKind::Struct(StructType {
                name: name.to_string(),
                type_params,
                fields: Vec::new(),
            }),
            size: 0,
            align: 1,
        })
    }

    pub fn set_struct_fields(&mut self, id: TypeId, fields: Vec<(String, TypeId)>) {
        let mut laid_out = Vec::new();
        let mut offset = 0usize;
        let mut align = 1usize;
        for (name, ty) in fields {
            let field_desc = self.get(ty);
            let field_align = field_desc.align.max(1);
            let field_size = field_desc.size;
            offset = round_up(offset, field_align);
            laid_out.push(FieldInfo {
                name,
                ty,
                offset,
            });
            offset += field_size;
            align = align.max(field_align);
        }
        let size = round_up(offset, align);

        let descriptor = &mut self.types[id.0 as usize];
        if let TypeKind::Struct(s) = &mut descriptor.kind {
            s.fields = laid_out;
        }
        descriptor.size = size;
        descriptor.align = align;
    }

    pub fn declare_enum(&mut self, name: &str, type_params: Vec<String>) -> TypeId {
        self.push(TypeDescriptor {
            kind: TypeKind::Enum(EnumType {
                name: name.to_string(),
                type_params,
                variants: Vec::new(),
            }),
            size: POINTER_SIZE,
            align: POINTER_SIZE,
        })
    }

    pub fn set_enum_variants(&mut self, id: TypeId, variants: Vec<VariantInfo>) {
        let payload_max = variants
            .iter()
            .filter_map(|v| v.payload)
            .map(|p| self.get(p).size)
            .max()
            .unwrap_or(0);

        let descriptor = &mut self.types[id.0 as usize];
        if let TypeKind::Enum(e) = &mut descriptor.kind {
            e.variants = variants;
        }
        // Discriminant word plus the widest payload
        descriptor.size = POINTER_SIZE + round_up(payload_max, POINTER_SIZE);
        descriptor.align = POINTER_SIZE;
    }

    // ==================== Method tables ====================

    pub fn add_method(&mut self, owner: TypeId, method: MethodInfo) -> bool {
        let table = self.methods.entry(owner).or_default();
        if table.contains_key(&method.name) {
            return false;
        }
        table.insert(method.name.clone(), method);
        true
    }

    pub fn lookup_method(&self, owner: TypeId, name: &str) -> Option<&MethodInfo> {
        self.methods.get(&owner)?.get(name)
    }

    pub fn method_names(&self, owner: TypeId) -> Vec<String> {
        self.methods
            .get(&owner)
            .map(|table| table.keys().cloned().collect())
            .unwrap_or_default()
    }

    // ==================== Relations ====================

    /// Assignment/return compatibility: identical descriptors are
    /// compatible, and a Never value is compatible with every type.
    /// Numeric widening is never automatic.
    pub fn compatible(&self, expected: TypeId, actual: TypeId) -> bool {
        expected == actual || self.is_never(actual)
    }

    /// Substitute type parameters (by name) in a descriptor tree,
    /// producing interned results. Used to view generic struct/enum
    /// members through a concrete instance.
    pub fn substitute(&mut self, ty: TypeId, mapping: &HashMap<String, TypeId>) -> TypeId {
        if mapping.is_empty() {
            return ty;
        }
        match self.kind(ty).clone() {
            TypeKind::TypeParam { name } => mapping.get(&name).copied().unwrap_or(ty),
            TypeKind::Slice { element } => {
                let element = self.substitute(element, mapping);
                self.intern(TypeKind::Slice { element })
            }
            TypeKind::Array { element, length } => {
                let element = self.substitute(element, mapping);
                self.intern(TypeKind::Array { element, length })
            }
            TypeKind::Pointer {
                pointee,
                is_mutable,
            } => {
                let pointee = self.substitute(pointee, mapping);
                self.intern(TypeKind::Pointer {
                    pointee,
                    is_mutable,
                })
            }
            TypeKind::Option { value } => {
                let value = self.substitute(value, mapping);
                self.intern(TypeKind::Option { value })
            }
            TypeKind::Result { ok, err } => {
                let ok = self.substitute(ok, mapping);
                let err = self.substitute(err, mapping);
                self.intern(TypeKind::Result { ok, err })
            }
            TypeKind::Tuple { elements, .. } => {
                let elements: Vec<TypeId> = elements
                    .into_iter()
                    .map(|e| self.substitute(e, mapping))
                    .collect();
                self.tuple(elements)
            }
            TypeKind::TaskHandle { result } => {
                let result = self.substitute(result, mapping);
                self.intern(TypeKind::TaskHandle { result })
            }
            TypeKind::Function(f) => {
                let params: Vec<TypeId> = f
                    .params
                    .iter()
                    .map(|&p| self.substitute(p, mapping))
                    .collect();
                let return_type = self.substitute(f.return_type, mapping);
                self.intern(TypeKind::Function(FunctionType {
                    params,
                    return_type,
                    is_extern: f.is_extern,
                    extern_abi: f.extern_abi,
                }))
            }
            TypeKind::GenericInstance { base, args } => {
                let args: Vec<TypeId> = args
                    .into_iter()
                    .map(|a| self.substitute(a, mapping))
                    .collect();
                self.intern(TypeKind::GenericInstance { base, args })
            }
            TypeKind::Primitive(_) | TypeKind::Struct(_) | TypeKind::Enum(_) => ty,
        }
    }

    /// Tuple constructor computing element offsets.
    pub fn tuple(&mut self, elements: Vec<TypeId>) -> TypeId {
        let key = InternKey::Tuple(elements.clone());
        if let Some(&id) = self.interned.get(&key) {
            return id;
        }
        let mut offsets = Vec::new();
        let mut offset = 0usize;
        let mut align = 1usize;
        for &element in &elements {
            let descriptor = self.get(element);
            let elem_align = descriptor.align.max(1);
            offset = round_up(offset, elem_align);
            offsets.push(offset);
            offset += descriptor.size;
            align = align.max(elem_align);
        }
        let size = round_up(offset, align);
        let id = self.push(TypeDescriptor {
            kind: TypeKind::Tuple { elements, offsets },
            size,
            align,
        });
        self.interned.insert(key, id);
        id
    }

    /// Human-readable rendering for diagnostics.
    pub fn display(&self, id: TypeId) -> String {
        match self.kind(id) {
            TypeKind::Primitive(p) => p.name().to_string(),
            TypeKind::Struct(s) => s.name.clone(),
            TypeKind::Enum(e) => e.name.clone(),
            TypeKind::Slice { element } => format!("[]{}", self.display(*element)),
            TypeKind::Array { element, length } => {
                format!("[{}]{}", length, self.display(*element))
            }
            TypeKind::Pointer {
                pointee,
                is_mutable,
            } => format!(
                "*{} {}",
                if *is_mutable { "mut" } else { "const" },
                self.display(*pointee)
            ),
            TypeKind::Option { value } => format!("Option<{}>", self.display(*value)),
            TypeKind::Result { ok, err } => {
                format!("Result<{}, {}>", self.display(*ok), self.display(*err))
            }
            TypeKind::Tuple { elements, .. } => {
                let inner: Vec<String> = elements.iter().map(|&e| self.display(e)).collect();
                format!("({})", inner.join(", "))
            }
            TypeKind::Function(f) => {
                let params: Vec<String> = f.params.iter().map(|&p| self.display(p)).collect();
                format!(
                    "fn({}) -> {}",
                    params.join(", "),
                    self.display(f.return_type)
                )
            }
            TypeKind::TaskHandle { result } => {
                format!("TaskHandle<{}>", self.display(*result))
            }
            TypeKind::GenericInstance { base, args } => {
                let rendered: Vec<String> = args.iter().map(|&a| self.display(a)).collect();
                format!("{}<{}>", self.display(*base), rendered.join(", "))
            }
            TypeKind::TypeParam { name } => name.clone(),
        }
    }

    /// Base nominal type behind a generic instance, or the type itself.
    pub fn base_of(&self, id: TypeId) -> TypeId {
        match self.kind(id) {
            TypeKind::GenericInstance { base, .. } => *base,
            _ => id,
        }
    }

    /// Type-parameter substitution map for a generic instance.
    pub fn instance_mapping(&self, id: TypeId) -> HashMap<String, TypeId> {
        let mut mapping = HashMap::new();
        if let TypeKind::GenericInstance { base, args } = self.kind(id) {
            let params = match self.kind(*base) {
                TypeKind::Struct(s) => s.type_params.clone(),
                TypeKind::Enum(e) => e.type_params.clone(),
                _ => Vec::new(),
            };
            for (param, &arg) in params.iter().zip(args.iter()) {
                mapping.insert(param.clone(), arg);
            }
        }
        mapping
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    fn push(&mut self, descriptor: TypeDescriptor) -> TypeId {
        let id = TypeId(self.types.len() as u32);
        self.types.push(descriptor);
        id
    }

    fn layout_of(&self, kind: &TypeKind) -> (usize, usize) {
        match kind {
            TypeKind::Primitive(p) => primitive_layout(*p),
            TypeKind::Slice { .. } => (2 * POINTER_SIZE, POINTER_SIZE),
            TypeKind::Array { element, length } => {
                let descriptor = self.get(*element);
                (descriptor.size * length, descriptor.align.max(1))
            }
            TypeKind::Pointer { .. }
            | TypeKind::Function(_)
            | TypeKind::TaskHandle { .. } => (POINTER_SIZE, POINTER_SIZE),
            TypeKind::Option { value } => {
                let descriptor = self.get(*value);
                (
                    POINTER_SIZE + round_up(descriptor.size, POINTER_SIZE),
                    POINTER_SIZE,
                )
            }
            TypeKind::Result { ok, err } => {
                let widest = self.get(*ok).size.max(self.get(*err).size);
                (POINTER_SIZE + round_up(widest, POINTER_SIZE), POINTER_SIZE)
            }
            TypeKind::Tuple { elements, .. } => {
                // tuple() computes real offsets; this path only runs for
                // pre-built kinds
                let mut offset = 0usize;
                let mut align = 1usize;
                for &element in elements {
                    let descriptor = self.get(element);
                    let elem_align = descriptor.align.max(1);
                    offset = round_up(offset, elem_align) + descriptor.size;
                    align = align.max(elem_align);
                }
                (round_up(offset, align), align)
            }
            TypeKind::GenericInstance { base, .. } => {
                let descriptor = self.get(*base);
                (descriptor.size, descriptor.align)
            }
            TypeKind::Struct(_) | TypeKind::Enum(_) | TypeKind::TypeParam { .. } => (0, 1),
        }
    }
}

fn primitive_layout(p: PrimitiveType) -> (usize, usize) {
    match p {
        PrimitiveType::Bool | PrimitiveType::I8 | PrimitiveType::U8 => (1, 1),
        PrimitiveType::I16 | PrimitiveType::U16 => (2, 2),
        PrimitiveType::I32 | PrimitiveType::U32 | PrimitiveType::F32 | PrimitiveType::Char => {
            (4, 4)
        }
        PrimitiveType::I64
        | PrimitiveType::U64
        | PrimitiveType::F64
        | PrimitiveType::Usize
        | PrimitiveType::Isize => (8, 8),
        PrimitiveType::I128 | PrimitiveType::U128 => (16, 16),
        PrimitiveType::String => (2 * POINTER_SIZE, POINTER_SIZE),
        PrimitiveType::Void | PrimitiveType::Never => (0, 1),
    }
}

fn round_up(value: usize, align: usize) -> usize {
    if align <= 1 {
        value
    } else {
        value.div_ceil(align) * align
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primitive_interning() {
        let mut table = TypeTable::new();
        let a = table.primitive(PrimitiveType::I32);
        let b = table.primitive(PrimitiveType::I32);
        assert_eq!(a, b);
        assert_ne!(a, table.primitive(PrimitiveType::I64));
        // usize is its own primitive, not an alias of u64
        assert_ne!(
            table.primitive(PrimitiveType::Usize),
            table.primitive(PrimitiveType::U64)
        );
    }

    #[test]
    fn test_composite_interning() {
        let mut table = TypeTable::new();
        let i32_id = table.primitive(PrimitiveType::I32);
        let a = table.intern(TypeKind::Slice { element: i32_id });
        let b = table.intern(TypeKind::Slice { element: i32_id });
        assert_eq!(a, b);
        assert_eq!(table.display(a), "[]i32");
    }

    #[test]
    fn test_generic_instance_equality() {
        let mut table = TypeTable::new();
        let base = table.declare_struct("Vec", vec!["T".to_string()]);
        let i32_id = table.primitive(PrimitiveType::I32);
        let u64_id = table.primitive(PrimitiveType::U64);

        let a = table.intern(TypeKind::GenericInstance {
            base,
            args: vec![i32_id],
        });
        let b = table.intern(TypeKind::GenericInstance {
            base,
            args: vec![i32_id],
        });
        let c = table.intern(TypeKind::GenericInstance {
            base,
            args: vec![u64_id],
        });

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(table.display(a), "Vec<i32>");
    }

    #[test]
    fn test_struct_layout() {
        let mut table = TypeTable::new();
        let id = table.declare_struct("Pair", vec![]);
        let a = table.primitive(PrimitiveType::U8);
        let b = table.primitive(PrimitiveType::U64);
        table.set_struct_fields(id, vec![("a".to_string(), a), ("b".to_string(), b)]);

        let descriptor = table.get(id);
        assert_eq!(descriptor.align, 8);
        assert_eq!(descriptor.size, 16);
        if let TypeKind::Struct(s) = &descriptor.kind {
            assert_eq!(s.fields[1].offset, 8);
        } else {
            panic!("not a struct");
        }
    }

    #[test]
    fn test_tuple_offsets() {
        let mut table = TypeTable::new();
        let i32_id = table.primitive(PrimitiveType::I32);
        let f64_id = table.primitive(PrimitiveType::F64);
        let id = table.tuple(vec![i32_id, f64_id]);

        if let TypeKind::Tuple { offsets, .. } = table.kind(id) {
            assert_eq!(offsets, &vec![0, 8]);
        } else {
            panic!("not a tuple");
        }
        assert_eq!(table.get(id).size, 16);
    }

    #[test]
    fn test_never_compatibility() {
        let mut table = TypeTable::new();
        let never = table.primitive(PrimitiveType::Never);
        let i32_id = table.primitive(PrimitiveType::I32);
        let i64_id = table.primitive(PrimitiveType::I64);

        // Never is assignment-compatible with everything
        assert!(table.compatible(i32_id, never));
        // but not the other way around
        assert!(!table.compatible(never, i32_id));
        // and numeric widening is never automatic
        assert!(!table.compatible(i64_id, i32_id));
    }

    #[test]
    fn test_substitution() {
        let mut table = TypeTable::new();
        let t_param = table.intern(TypeKind::TypeParam {
            name: "T".to_string(),
        });
        let slice_t = table.intern(TypeKind::Slice { element: t_param });
        let i32_id = table.primitive(PrimitiveType::I32);

        let mut mapping = HashMap::new();
        mapping.insert("T".to_string(), i32_id);
        let substituted = table.substitute(slice_t, &mapping);

        assert_eq!(table.display(substituted), "[]i32");
        let direct = table.intern(TypeKind::Slice { element: i32_id });
        assert_eq!(substituted, direct);
    }
}
