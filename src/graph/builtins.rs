//! Built-in XSD datatypes

use crate::namespaces::QName;

macro_rules! builtins {
    ($($variant:ident => $name:literal,)*) => {
        /// A built-in datatype of the XSD namespace
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[allow(missing_docs)]
        pub enum Builtin {
            $($variant,)*
        }

        impl Builtin {
            /// Every built-in, in declaration order
            pub const ALL: &'static [Builtin] = &[$(Builtin::$variant,)*];

            /// Local name in the XSD namespace
            pub fn name(&self) -> &'static str {
                match self {
                    $(Builtin::$variant => $name,)*
                }
            }

            /// Look up a built-in by local name
            pub fn from_name(local_name: &str) -> Option<Self> {
                match local_name {
                    $($name => Some(Builtin::$variant),)*
                    _ => None,
                }
            }
        }
    };
}

builtins! {
    AnyType => "anyType",
    AnySimpleType => "anySimpleType",
    AnyAtomicType => "anyAtomicType",
    String => "string",
    NormalizedString => "normalizedString",
    Token => "token",
    Language => "language",
    Name => "Name",
    NcName => "NCName",
    Id => "ID",
    IdRef => "IDREF",
    IdRefs => "IDREFS",
    Entity => "ENTITY",
    Entities => "ENTITIES",
    NmToken => "NMTOKEN",
    NmTokens => "NMTOKENS",
    Boolean => "boolean",
    Decimal => "decimal",
    Integer => "integer",
    Long => "long",
    Int => "int",
    Short => "short",
    Byte => "byte",
    NonNegativeInteger => "nonNegativeInteger",
    PositiveInteger => "positiveInteger",
    UnsignedLong => "unsignedLong",
    UnsignedInt => "unsignedInt",
    UnsignedShort => "unsignedShort",
    UnsignedByte => "unsignedByte",
    NonPositiveInteger => "nonPositiveInteger",
    NegativeInteger => "negativeInteger",
    Float => "float",
    Double => "double",
    Duration => "duration",
    DayTimeDuration => "dayTimeDuration",
    YearMonthDuration => "yearMonthDuration",
    DateTime => "dateTime",
    DateTimeStamp => "dateTimeStamp",
    Time => "time",
    Date => "date",
    GYearMonth => "gYearMonth",
    GYear => "gYear",
    GMonthDay => "gMonthDay",
    GDay => "gDay",
    GMonth => "gMonth",
    HexBinary => "hexBinary",
    Base64Binary => "base64Binary",
    AnyUri => "anyURI",
    QName => "QName",
    Notation => "NOTATION",
}

impl Builtin {
    /// Resolve a qualified name in the XSD namespace
    pub fn from_qname(qname: &QName) -> Option<Self> {
        if qname.is_xsd() {
            Self::from_name(&qname.local_name)
        } else {
            None
        }
    }

    /// The whitespace-separated list types
    pub fn is_list(&self) -> bool {
        matches!(self, Builtin::IdRefs | Builtin::Entities | Builtin::NmTokens)
    }

    /// Item type of a built-in list type
    pub fn list_item(&self) -> Option<Builtin> {
        match self {
            Builtin::IdRefs => Some(Builtin::IdRef),
            Builtin::Entities => Some(Builtin::Entity),
            Builtin::NmTokens => Some(Builtin::NmToken),
            _ => None,
        }
    }

    /// `anyType` is the only complex built-in
    pub fn is_complex(&self) -> bool {
        matches!(self, Builtin::AnyType)
    }
}
