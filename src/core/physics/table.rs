//! The physics macro table.
//!
//! Every macro is a static [`MacroSpec`]: how its arguments are consumed and
//! which [`Handler`] builds its output. Aliases share a spec value.

use indexmap::IndexMap;
use lazy_static::lazy_static;
use phf::phf_map;

use super::delimiters::Delimiter;

/// What a `[...]` (or size keyword) after the macro name means.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionalArgKind {
    /// `\big`..`\Bigg` right after the name (`\qty\Big(`).
    Size,
    /// Derivative or power order, used as an exponent.
    Order,
    /// Free sub-expression (matrix filler).
    Expression,
}

/// What a required slot accepts when it does not start with `{`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgFallback {
    /// Only a braced group counts.
    BracedGroup,
    /// Any single token counts (`\dv x`).
    SingleToken,
    /// The first slot must be braced, later slots may be single tokens.
    FirstBraced,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    /// Absent arguments become empty rows.
    Soft,
    /// Absent arguments are a `MissingArgument` error.
    Hard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputShape {
    Fenced,
    Fraction,
    Matrix,
    Literal,
}

/// Differential glyph of a derivative family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffSymbol {
    /// `d`
    Total,
    /// `∂`
    Partial,
    /// `δ`
    Functional,
}

/// Nabla-based vector operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VectorOperator {
    Gradient,
    Divergence,
    Curl,
    Laplacian,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handler {
    Quantity,
    Fence(Delimiter),
    Order,
    Evaluated,
    Commutator(Delimiter),
    Bra,
    Ket,
    BraKet,
    KetBra,
    Expectation,
    MatrixElement,
    VectorBold,
    VectorAccent(&'static str),
    Product(&'static str),
    VectorOperator(VectorOperator),
    NamedOperator { text: &'static str, calligraphic: bool },
    Derivative(DiffSymbol),
    Differential(DiffSymbol),
    MatrixQuantity { small: bool, fence: Option<Delimiter> },
    IdentityMatrix,
    ZeroMatrix,
    PauliMatrix,
    DiagonalMatrix { anti: bool },
    XMatrix,
}

/// Static definition of one macro.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MacroSpec {
    pub name: &'static str,
    pub takes_star: bool,
    /// Also accept `**`.
    pub double_star: bool,
    pub optional: Option<OptionalArgKind>,
    pub required: u8,
    pub fallback: ArgFallback,
    pub requirement: Requirement,
    /// Trailing slots consumed only when they start with `{`.
    pub extra_braced: u8,
    /// Trailing slots read as raw text (dimensions, indices).
    pub raw_tail: u8,
    pub shape: OutputShape,
    pub handler: Handler,
}

impl MacroSpec {
    pub const fn new(name: &'static str, shape: OutputShape, handler: Handler) -> Self {
        Self {
            name,
            takes_star: false,
            double_star: false,
            optional: None,
            required: 0,
            fallback: ArgFallback::BracedGroup,
            requirement: Requirement::Hard,
            extra_braced: 0,
            raw_tail: 0,
            shape,
            handler,
        }
    }

    pub const fn star(self) -> Self {
        Self {
            takes_star: true,
            ..self
        }
    }

    pub const fn doubled_star(self) -> Self {
        Self {
            takes_star: true,
            double_star: true,
            ..self
        }
    }

    pub const fn optional(self, kind: OptionalArgKind) -> Self {
        Self {
            optional: Some(kind),
            ..self
        }
    }

    pub const fn args(self, required: u8, fallback: ArgFallback) -> Self {
        Self {
            required,
            fallback,
            ..self
        }
    }

    pub const fn soft(self) -> Self {
        Self {
            requirement: Requirement::Soft,
            ..self
        }
    }

    pub const fn extra(self, extra_braced: u8) -> Self {
        Self {
            extra_braced,
            ..self
        }
    }

    pub const fn raw(self, raw_tail: u8) -> Self {
        Self { raw_tail, ..self }
    }

    /// Largest number of parsed arguments the macro can take.
    pub fn max_args(&self) -> usize {
        (self.required + self.extra_braced) as usize
    }
}

// =============================================================================
// Spec constructors
// =============================================================================

const fn fence(name: &'static str, delim: Delimiter) -> MacroSpec {
    MacroSpec::new(name, OutputShape::Fenced, Handler::Fence(delim))
        .star()
        .optional(OptionalArgKind::Size)
        .args(1, ArgFallback::BracedGroup)
}

const fn commutator(name: &'static str, delim: Delimiter) -> MacroSpec {
    MacroSpec::new(name, OutputShape::Fenced, Handler::Commutator(delim))
        .star()
        .optional(OptionalArgKind::Size)
        .args(2, ArgFallback::FirstBraced)
}

const fn braket(name: &'static str, handler: Handler, required: u8, extra: u8) -> MacroSpec {
    MacroSpec::new(name, OutputShape::Fenced, handler)
        .star()
        .args(required, ArgFallback::SingleToken)
        .extra(extra)
}

const fn vector(name: &'static str, handler: Handler) -> MacroSpec {
    MacroSpec::new(name, OutputShape::Literal, handler)
        .star()
        .args(1, ArgFallback::SingleToken)
}

const fn operator(name: &'static str, op: VectorOperator) -> MacroSpec {
    MacroSpec::new(name, OutputShape::Literal, Handler::VectorOperator(op))
        .star()
        .optional(OptionalArgKind::Size)
}

const fn named(name: &'static str, text: &'static str) -> MacroSpec {
    MacroSpec::new(
        name,
        OutputShape::Literal,
        Handler::NamedOperator {
            text,
            calligraphic: false,
        },
    )
    .star()
    .optional(OptionalArgKind::Order)
}

const fn derivative(name: &'static str, symbol: DiffSymbol, max_slots: u8) -> MacroSpec {
    MacroSpec::new(name, OutputShape::Fraction, Handler::Derivative(symbol))
        .star()
        .optional(OptionalArgKind::Order)
        .args(1, ArgFallback::SingleToken)
        .extra(max_slots - 1)
}

const fn differential(name: &'static str, symbol: DiffSymbol) -> MacroSpec {
    MacroSpec::new(name, OutputShape::Literal, Handler::Differential(symbol))
        .optional(OptionalArgKind::Order)
}

/// The grid body is read by the matrix handler itself, cell by cell.
const fn mqty(name: &'static str, small: bool, fence: Option<Delimiter>) -> MacroSpec {
    let spec = MacroSpec::new(name, OutputShape::Matrix, Handler::MatrixQuantity { small, fence });
    match fence {
        Some(_) => spec,
        None => spec.star(),
    }
}

const fn generator(name: &'static str, handler: Handler, raw_tail: u8) -> MacroSpec {
    MacroSpec::new(name, OutputShape::Matrix, handler).raw(raw_tail)
}

const fn diagonal(name: &'static str, anti: bool) -> MacroSpec {
    MacroSpec::new(name, OutputShape::Matrix, Handler::DiagonalMatrix { anti })
        .optional(OptionalArgKind::Expression)
}

const QUANTITY: MacroSpec = MacroSpec::new("quantity", OutputShape::Fenced, Handler::Quantity)
    .star()
    .optional(OptionalArgKind::Size)
    .soft();
const ABS: MacroSpec = fence("absolutevalue", Delimiter::Vert);
const ORDER: MacroSpec = MacroSpec::new("order", OutputShape::Fenced, Handler::Order)
    .star()
    .optional(OptionalArgKind::Size)
    .args(1, ArgFallback::BracedGroup);
const EVAL: MacroSpec = MacroSpec::new("evaluated", OutputShape::Fenced, Handler::Evaluated).star();
const COMM: MacroSpec = commutator("commutator", Delimiter::Bracket);
const ACOMM: MacroSpec = commutator("anticommutator", Delimiter::Brace);
const PB: MacroSpec = commutator("poissonbracket", Delimiter::Brace);
const BRAKET: MacroSpec = braket("innerproduct", Handler::BraKet, 1, 1);
const KETBRA: MacroSpec = braket("outerproduct", Handler::KetBra, 1, 1);
const EV: MacroSpec = braket("expectationvalue", Handler::Expectation, 1, 1).doubled_star();
const MEL: MacroSpec = braket("matrixelement", Handler::MatrixElement, 3, 0).doubled_star();
const VB: MacroSpec = vector("vectorbold", Handler::VectorBold);
const VA: MacroSpec = vector("vectorarrow", Handler::VectorAccent("→"));
const VU: MacroSpec = vector("vectorunit", Handler::VectorAccent("^"));
const VDOT: MacroSpec = MacroSpec::new("dotproduct", OutputShape::Literal, Handler::Product("·"));
const CROSS: MacroSpec = MacroSpec::new("crossproduct", OutputShape::Literal, Handler::Product("×"));
const GRAD: MacroSpec = operator("gradient", VectorOperator::Gradient);
const DIV: MacroSpec = operator("divergence", VectorOperator::Divergence);
const LAPLACIAN: MacroSpec = operator("laplacian", VectorOperator::Laplacian);
const TRACE: MacroSpec = named("trace", "tr");
const TRACE_UPPER: MacroSpec = named("Trace", "Tr");
const PV: MacroSpec = MacroSpec::new(
    "principalvalue",
    OutputShape::Literal,
    Handler::NamedOperator {
        text: "P",
        calligraphic: true,
    },
)
.star()
.optional(OptionalArgKind::Order);
const DV: MacroSpec = derivative("derivative", DiffSymbol::Total, 2);
const PDV: MacroSpec = derivative("partialderivative", DiffSymbol::Partial, 3);
const FDV: MacroSpec = derivative("functionalderivative", DiffSymbol::Functional, 2);
const DD: MacroSpec = differential("differential", DiffSymbol::Total);
const VAR: MacroSpec = differential("variation", DiffSymbol::Functional);
const MQTY: MacroSpec = mqty("matrixquantity", false, None);
const SMQTY: MacroSpec = mqty("smallmatrixquantity", true, None);
const MDET: MacroSpec = mqty("matrixdeterminant", false, Some(Delimiter::Vert));
const IMAT: MacroSpec = generator("identitymatrix", Handler::IdentityMatrix, 1);
const ZMAT: MacroSpec = generator("zeromatrix", Handler::ZeroMatrix, 2);
const PMAT: MacroSpec = generator("paulimatrix", Handler::PauliMatrix, 1);
const DMAT: MacroSpec = diagonal("diagonalmatrix", false);
const ADMAT: MacroSpec = diagonal("antidiagonalmatrix", true);
const XMAT: MacroSpec = MacroSpec::new("xmatrix", OutputShape::Matrix, Handler::XMatrix)
    .star()
    .args(1, ArgFallback::BracedGroup)
    .raw(2);

/// All physics macros, keyed by control word name.
pub const PHYSICS_MACROS: phf::Map<&'static str, MacroSpec> = phf_map! {
    // Automatic bracing
    "quantity" => QUANTITY,
    "qty" => QUANTITY,
    "pqty" => fence("pqty", Delimiter::Paren),
    "bqty" => fence("bqty", Delimiter::Bracket),
    "vqty" => fence("vqty", Delimiter::Vert),
    "Bqty" => fence("Bqty", Delimiter::Brace),
    "absolutevalue" => ABS,
    "abs" => ABS,
    "norm" => fence("norm", Delimiter::DoubleVert),
    "order" => ORDER,
    "evaluated" => EVAL,
    "eval" => EVAL,
    "commutator" => COMM,
    "comm" => COMM,
    "anticommutator" => ACOMM,
    "acomm" => ACOMM,
    "poissonbracket" => PB,
    "pb" => PB,
    // Vector notation
    "vectorbold" => VB,
    "vb" => VB,
    "vectorarrow" => VA,
    "va" => VA,
    "vectorunit" => VU,
    "vu" => VU,
    "dotproduct" => VDOT,
    "vdot" => VDOT,
    "crossproduct" => CROSS,
    "cross" => CROSS,
    "cp" => CROSS,
    "gradient" => GRAD,
    "grad" => GRAD,
    "divergence" => DIV,
    "div" => DIV,
    "curl" => operator("curl", VectorOperator::Curl),
    "laplacian" => LAPLACIAN,
    // Operators
    "sin" => named("sin", "sin"),
    "cos" => named("cos", "cos"),
    "tan" => named("tan", "tan"),
    "csc" => named("csc", "csc"),
    "sec" => named("sec", "sec"),
    "cot" => named("cot", "cot"),
    "arcsin" => named("arcsin", "arcsin"),
    "arccos" => named("arccos", "arccos"),
    "arctan" => named("arctan", "arctan"),
    "arccsc" => named("arccsc", "arccsc"),
    "arcsec" => named("arcsec", "arcsec"),
    "arccot" => named("arccot", "arccot"),
    "sinh" => named("sinh", "sinh"),
    "cosh" => named("cosh", "cosh"),
    "tanh" => named("tanh", "tanh"),
    "csch" => named("csch", "csch"),
    "sech" => named("sech", "sech"),
    "coth" => named("coth", "coth"),
    "exp" => named("exp", "exp"),
    "log" => named("log", "log"),
    "ln" => named("ln", "ln"),
    "det" => named("det", "det"),
    "Pr" => named("Pr", "Pr"),
    "trace" => TRACE,
    "tr" => TRACE,
    "Trace" => TRACE_UPPER,
    "Tr" => TRACE_UPPER,
    "rank" => named("rank", "rank"),
    "erf" => named("erf", "erf"),
    "Res" => named("Res", "Res"),
    "Re" => named("Re", "Re"),
    "Im" => named("Im", "Im"),
    "principalvalue" => PV,
    "pv" => PV,
    "PV" => named("PV", "P.V."),
    // Derivatives
    "derivative" => DV,
    "dv" => DV,
    "partialderivative" => PDV,
    "pderivative" => PDV,
    "pdv" => PDV,
    "functionalderivative" => FDV,
    "fdv" => FDV,
    "differential" => DD,
    "dd" => DD,
    "variation" => VAR,
    "var" => VAR,
    // Dirac bra-ket notation
    "bra" => braket("bra", Handler::Bra, 1, 0),
    "ket" => braket("ket", Handler::Ket, 1, 0),
    "innerproduct" => BRAKET,
    "ip" => BRAKET,
    "braket" => BRAKET,
    "outerproduct" => KETBRA,
    "dyad" => KETBRA,
    "ketbra" => KETBRA,
    "op" => KETBRA,
    "expectationvalue" => EV,
    "expval" => EV,
    "ev" => EV,
    "matrixelement" => MEL,
    "matrixel" => MEL,
    "mel" => MEL,
    // Matrix macros
    "matrixquantity" => MQTY,
    "mqty" => MQTY,
    "smallmatrixquantity" => SMQTY,
    "smqty" => SMQTY,
    "pmqty" => mqty("pmqty", false, Some(Delimiter::Paren)),
    "Pmqty" => mqty("Pmqty", false, Some(Delimiter::Group)),
    "bmqty" => mqty("bmqty", false, Some(Delimiter::Bracket)),
    "vmqty" => mqty("vmqty", false, Some(Delimiter::Vert)),
    "spmqty" => mqty("spmqty", true, Some(Delimiter::Paren)),
    "sPmqty" => mqty("sPmqty", true, Some(Delimiter::Group)),
    "sbmqty" => mqty("sbmqty", true, Some(Delimiter::Bracket)),
    "svmqty" => mqty("svmqty", true, Some(Delimiter::Vert)),
    "matrixdeterminant" => MDET,
    "mdet" => MDET,
    "smdet" => mqty("smdet", true, Some(Delimiter::Vert)),
    "identitymatrix" => IMAT,
    "imat" => IMAT,
    "zeromatrix" => ZMAT,
    "zmat" => ZMAT,
    "paulimatrix" => PMAT,
    "pmat" => PMAT,
    "diagonalmatrix" => DMAT,
    "dmat" => DMAT,
    "antidiagonalmatrix" => ADMAT,
    "admat" => ADMAT,
    "xmatrix" => XMAT,
    "xmat" => XMAT,
};

/// Name-ordered registry the host parser consults.
///
/// Starts from [`PHYSICS_MACROS`]; hosts may register more entries.
#[derive(Debug, Clone, Default)]
pub struct MacroTable {
    entries: IndexMap<String, MacroSpec>,
}

impl MacroTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// The full physics package, sorted by name.
    pub fn physics() -> Self {
        let mut names: Vec<&'static str> = PHYSICS_MACROS.keys().copied().collect();
        names.sort_unstable();
        let mut table = Self::new();
        for name in names {
            if let Some(spec) = PHYSICS_MACROS.get(name) {
                table.register(name, *spec);
            }
        }
        table
    }

    /// Add or replace an entry, returning the replaced spec.
    pub fn register(&mut self, name: impl Into<String>, spec: MacroSpec) -> Option<MacroSpec> {
        self.entries.insert(name.into(), spec)
    }

    pub fn get(&self, name: &str) -> Option<&MacroSpec> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &MacroSpec)> {
        self.entries.iter().map(|(name, spec)| (name.as_str(), spec))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

lazy_static! {
    /// The default physics table.
    pub static ref DEFAULT_TABLE: MacroTable = MacroTable::physics();
}
