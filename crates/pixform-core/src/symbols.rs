//! Built-in symbols: operators, named values, and functions.
//!
//! The descriptors live in static tables; [`SymbolTable`] indexes them by
//! their textual key. Function keys carry the opening parenthesis of the
//! call (`"sin("`) so that a function and a value may share a name.
//! Lookups use the full key.

use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

use crate::context::{Channel, Slot};
use crate::optimize::Foldability;

/// Golden ratio, bound to `j`.
pub const GOLDEN_RATIO: f64 = 1.618033989;

/// Precedence tier of a binary operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    /// `+` and `-`.
    Additive,
    /// `*`, `/`, `^` and `%`, all on the same level.
    Multiplicative,
}

/// A binary operator.
#[derive(Debug)]
pub struct OperatorDef {
    pub key: &'static str,
    pub description: &'static str,
    pub tier: Tier,
    pub foldable: bool,
    pub apply: fn(f64, f64) -> f64,
}

impl OperatorDef {
    pub fn symbol(&self) -> char {
        self.key.chars().next().unwrap_or('?')
    }
}

/// What a named value reads when evaluated.
#[derive(Debug, Clone, Copy)]
pub enum Binding {
    Fixed(f64),
    Slot(Slot),
}

/// A named constant or coordinate variable.
#[derive(Debug)]
pub struct ValueDef {
    pub key: &'static str,
    pub description: &'static str,
    pub binding: Binding,
}

impl ValueDef {
    /// Fixed constants may take part in a fold; coordinate variables never do.
    pub fn foldability(&self) -> Foldability {
        match self.binding {
            Binding::Fixed(_) => Foldability::Term,
            Binding::Slot(_) => Foldability::CannotFold,
        }
    }
}

/// Number of arguments a function accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    None,
    One,
    Two,
    /// One or more.
    AtLeastOne,
}

impl Arity {
    pub fn accepts(self, count: usize) -> bool {
        match self {
            Self::None => count == 0,
            Self::One => count == 1,
            Self::Two => count == 2,
            Self::AtLeastOne => count >= 1,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "takes no argument"),
            Self::One => write!(f, "takes exactly one argument"),
            Self::Two => write!(f, "takes exactly two arguments"),
            Self::AtLeastOne => write!(f, "takes at least one argument"),
        }
    }
}

/// Running aggregate over a variable argument list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reduction {
    Min,
    Max,
    Avg,
}

/// Native implementation behind a function symbol.
#[derive(Debug, Clone, Copy)]
pub enum Native {
    Unary(fn(f64) -> f64),
    Binary(fn(f64, f64) -> f64),
    Reduce(Reduction),
    /// Channel accessor at the two coordinate arguments.
    Sample(Channel),
    /// Accessor for whichever channel is being rendered.
    SampleCurrent,
    Random,
}

/// A callable function.
#[derive(Debug)]
pub struct FunctionDef {
    /// Name followed by `(`.
    pub key: &'static str,
    pub description: &'static str,
    pub arity: Arity,
    pub foldable: bool,
    pub native: Native,
}

impl FunctionDef {
    /// Function name without the call parenthesis.
    pub fn name(&self) -> &'static str {
        self.key.strip_suffix('(').unwrap_or(self.key)
    }
}

/// A symbol table entry.
#[derive(Debug, Clone, Copy)]
pub enum Symbol {
    Operator(&'static OperatorDef),
    Value(&'static ValueDef),
    Function(&'static FunctionDef),
}

impl Symbol {
    pub fn key(&self) -> &'static str {
        match self {
            Self::Operator(op) => op.key,
            Self::Value(value) => value.key,
            Self::Function(func) => func.key,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Operator(op) => op.description,
            Self::Value(value) => value.description,
            Self::Function(func) => func.description,
        }
    }
}

fn add(a: f64, b: f64) -> f64 {
    a + b
}

fn sub(a: f64, b: f64) -> f64 {
    a - b
}

fn mul(a: f64, b: f64) -> f64 {
    a * b
}

fn div(a: f64, b: f64) -> f64 {
    a / b
}

/// Integer remainder of the truncated operands. NaN when the divisor truncates to zero.
fn modulo(a: f64, b: f64) -> f64 {
    (a as i64)
        .checked_rem(b as i64)
        .map_or(f64::NAN, |r| r as f64)
}

fn sign(v: f64) -> f64 {
    if v == 0.0 {
        0.0
    } else if v > 0.0 {
        1.0
    } else {
        -1.0
    }
}

static OPERATORS: [OperatorDef; 6] = [
    OperatorDef { key: "+", description: "Addition", tier: Tier::Additive, foldable: true, apply: add },
    OperatorDef { key: "-", description: "Subtraction", tier: Tier::Additive, foldable: true, apply: sub },
    OperatorDef { key: "*", description: "Multiplication", tier: Tier::Multiplicative, foldable: true, apply: mul },
    OperatorDef { key: "/", description: "Division", tier: Tier::Multiplicative, foldable: true, apply: div },
    OperatorDef { key: "^", description: "Power", tier: Tier::Multiplicative, foldable: true, apply: f64::powf },
    OperatorDef { key: "%", description: "Modulo", tier: Tier::Multiplicative, foldable: true, apply: modulo },
];

static VALUES: [ValueDef; 9] = [
    ValueDef { key: "pi", description: "Pi", binding: Binding::Fixed(std::f64::consts::PI) },
    ValueDef { key: "e", description: "Euler's number", binding: Binding::Fixed(std::f64::consts::E) },
    ValueDef { key: "j", description: "Golden ratio", binding: Binding::Fixed(GOLDEN_RATIO) },
    ValueDef { key: "w", description: "Image width", binding: Binding::Slot(Slot::Width) },
    ValueDef { key: "h", description: "Image height", binding: Binding::Slot(Slot::Height) },
    ValueDef { key: "x", description: "Current column", binding: Binding::Slot(Slot::X) },
    ValueDef { key: "y", description: "Current row", binding: Binding::Slot(Slot::Y) },
    ValueDef { key: "r", description: "Distance from the image centre", binding: Binding::Slot(Slot::Radius) },
    ValueDef { key: "t", description: "Angle around the image centre", binding: Binding::Slot(Slot::Theta) },
];

static FUNCTIONS: [FunctionDef; 35] = [
    FunctionDef { key: "red(", description: "Red channel value at x, y coordinates", arity: Arity::Two, foldable: false, native: Native::Sample(Channel::Red) },
    FunctionDef { key: "gray(", description: "Gray channel value at x, y coordinates", arity: Arity::Two, foldable: false, native: Native::Sample(Channel::Gray) },
    FunctionDef { key: "green(", description: "Green channel value at x, y coordinates", arity: Arity::Two, foldable: false, native: Native::Sample(Channel::Green) },
    FunctionDef { key: "blue(", description: "Blue channel value at x, y coordinates", arity: Arity::Two, foldable: false, native: Native::Sample(Channel::Blue) },
    FunctionDef { key: "alpha(", description: "Alpha channel value at x, y coordinates", arity: Arity::Two, foldable: false, native: Native::Sample(Channel::Alpha) },
    FunctionDef { key: "rgb(", description: "Value of the channel being rendered at x, y coordinates", arity: Arity::Two, foldable: false, native: Native::SampleCurrent },
    FunctionDef { key: "rand(", description: "Random value between 0.0 and 1.0", arity: Arity::None, foldable: false, native: Native::Random },
    FunctionDef { key: "abs(", description: "Absolute value", arity: Arity::One, foldable: true, native: Native::Unary(f64::abs) },
    FunctionDef { key: "sign(", description: "Sign of the value", arity: Arity::One, foldable: true, native: Native::Unary(sign) },
    FunctionDef { key: "sin(", description: "Sine", arity: Arity::One, foldable: true, native: Native::Unary(f64::sin) },
    FunctionDef { key: "sinh(", description: "Hyperbolic sine", arity: Arity::One, foldable: true, native: Native::Unary(f64::sinh) },
    FunctionDef { key: "asin(", description: "Arc sine", arity: Arity::One, foldable: true, native: Native::Unary(f64::asin) },
    FunctionDef { key: "asinh(", description: "Arc hyperbolic sine", arity: Arity::One, foldable: true, native: Native::Unary(f64::asinh) },
    FunctionDef { key: "cos(", description: "Cosine", arity: Arity::One, foldable: true, native: Native::Unary(f64::cos) },
    FunctionDef { key: "cosh(", description: "Hyperbolic cosine", arity: Arity::One, foldable: true, native: Native::Unary(f64::cosh) },
    FunctionDef { key: "acos(", description: "Arc cosine", arity: Arity::One, foldable: true, native: Native::Unary(f64::acos) },
    FunctionDef { key: "acosh(", description: "Arc hyperbolic cosine", arity: Arity::One, foldable: true, native: Native::Unary(f64::acosh) },
    FunctionDef { key: "tan(", description: "Tangent", arity: Arity::One, foldable: true, native: Native::Unary(f64::tan) },
    FunctionDef { key: "tanh(", description: "Hyperbolic tangent", arity: Arity::One, foldable: true, native: Native::Unary(f64::tanh) },
    FunctionDef { key: "atan(", description: "Arc tangent", arity: Arity::One, foldable: true, native: Native::Unary(f64::atan) },
    FunctionDef { key: "atan2(", description: "Arc tangent with correct quadrant", arity: Arity::Two, foldable: true, native: Native::Binary(f64::atan2) },
    FunctionDef { key: "atanh(", description: "Arc hyperbolic tangent", arity: Arity::One, foldable: true, native: Native::Unary(f64::atanh) },
    FunctionDef { key: "rad(", description: "Degrees to radians", arity: Arity::One, foldable: true, native: Native::Unary(f64::to_radians) },
    FunctionDef { key: "deg(", description: "Radians to degrees", arity: Arity::One, foldable: true, native: Native::Unary(f64::to_degrees) },
    FunctionDef { key: "sqrt(", description: "Square root", arity: Arity::One, foldable: true, native: Native::Unary(f64::sqrt) },
    FunctionDef { key: "cbrt(", description: "Cube root", arity: Arity::One, foldable: true, native: Native::Unary(f64::cbrt) },
    FunctionDef { key: "log(", description: "Natural logarithm", arity: Arity::One, foldable: true, native: Native::Unary(f64::ln) },
    FunctionDef { key: "log2(", description: "Base-2 logarithm", arity: Arity::One, foldable: true, native: Native::Unary(f64::log2) },
    FunctionDef { key: "log10(", description: "Base-10 logarithm", arity: Arity::One, foldable: true, native: Native::Unary(f64::log10) },
    FunctionDef { key: "exp(", description: "Base-e exponential", arity: Arity::One, foldable: true, native: Native::Unary(f64::exp) },
    FunctionDef { key: "ceil(", description: "Smallest integral value not less than the argument", arity: Arity::One, foldable: true, native: Native::Unary(f64::ceil) },
    FunctionDef { key: "round(", description: "Round to nearest integer, away from zero", arity: Arity::One, foldable: true, native: Native::Unary(f64::round) },
    FunctionDef { key: "min(", description: "Minimal value", arity: Arity::AtLeastOne, foldable: true, native: Native::Reduce(Reduction::Min) },
    FunctionDef { key: "max(", description: "Maximal value", arity: Arity::AtLeastOne, foldable: true, native: Native::Reduce(Reduction::Max) },
    FunctionDef { key: "avg(", description: "Average value", arity: Arity::AtLeastOne, foldable: true, native: Native::Reduce(Reduction::Avg) },
];

static GLOBAL: LazyLock<SymbolTable> = LazyLock::new(SymbolTable::new);

/// Index of every built-in symbol by key. Read-only once built.
#[derive(Debug, Clone)]
pub struct SymbolTable {
    symbols: HashMap<&'static str, Symbol>,
}

impl SymbolTable {
    /// Build a table holding the built-in operators, values and functions.
    pub fn new() -> Self {
        Self::from_symbols(
            OPERATORS
                .iter()
                .map(Symbol::Operator)
                .chain(VALUES.iter().map(Symbol::Value))
                .chain(FUNCTIONS.iter().map(Symbol::Function)),
        )
    }

    /// Build a table restricted to `symbols`, e.g. a subset of [`Self::global`].
    /// Formulas parsed against it reject anything left out.
    pub fn from_symbols<I: IntoIterator<Item = Symbol>>(symbols: I) -> Self {
        let symbols = symbols
            .into_iter()
            .map(|symbol| (symbol.key(), symbol))
            .collect();
        Self { symbols }
    }

    /// Process-wide table, built on first use.
    pub fn global() -> &'static SymbolTable {
        &GLOBAL
    }

    pub fn lookup(&self, key: &str) -> Option<Symbol> {
        self.symbols.get(key).copied()
    }

    pub fn operator(&self, symbol: char) -> Option<&'static OperatorDef> {
        let mut buf = [0u8; 4];
        match self.lookup(symbol.encode_utf8(&mut buf))? {
            Symbol::Operator(op) => Some(op),
            _ => None,
        }
    }

    pub fn value(&self, name: &str) -> Option<&'static ValueDef> {
        match self.lookup(name)? {
            Symbol::Value(value) => Some(value),
            _ => None,
        }
    }

    /// Look up a function by its bare name (`"sin"`, not `"sin("`).
    pub fn function(&self, name: &str) -> Option<&'static FunctionDef> {
        match self.lookup(&format!("{name}("))? {
            Symbol::Function(func) => Some(func),
            _ => None,
        }
    }

    /// Every symbol, operators first, then values, then functions, in
    /// declaration order.
    pub fn iter(&self) -> impl Iterator<Item = Symbol> + '_ {
        OPERATORS
            .iter()
            .map(Symbol::Operator)
            .chain(VALUES.iter().map(Symbol::Value))
            .chain(FUNCTIONS.iter().map(Symbol::Function))
            .filter(|symbol| self.symbols.contains_key(symbol.key()))
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_holds_every_builtin() {
        let table = SymbolTable::new();
        assert_eq!(table.len(), OPERATORS.len() + VALUES.len() + FUNCTIONS.len());
        assert_eq!(table.iter().count(), table.len());
    }

    #[test]
    fn test_kinds_are_disjoint() {
        let table = SymbolTable::global();
        assert!(table.operator('+').is_some());
        assert!(table.value("pi").is_some());
        assert!(table.function("sin").is_some());

        assert!(table.value("sin").is_none());
        assert!(table.function("pi").is_none());
        assert!(table.operator('x').is_none());
        assert!(table.operator('?').is_none());
    }

    #[test]
    fn test_lookup_uses_full_keys() {
        let table = SymbolTable::global();
        assert_eq!(table.function("log").map(|f| f.key), Some("log("));
        assert_eq!(table.function("log10").map(|f| f.key), Some("log10("));
        assert!(table.function("log1").is_none());
        assert!(table.value("pix").is_none());
    }

    #[test]
    fn test_arity_rules() {
        assert!(Arity::None.accepts(0));
        assert!(!Arity::None.accepts(1));
        assert!(Arity::One.accepts(1));
        assert!(!Arity::One.accepts(2));
        assert!(Arity::Two.accepts(2));
        assert!(!Arity::Two.accepts(1));
        assert!(Arity::AtLeastOne.accepts(5));
        assert!(!Arity::AtLeastOne.accepts(0));
    }

    #[test]
    fn test_purity_flags() {
        let table = SymbolTable::global();
        for name in ["red", "green", "blue", "gray", "alpha", "rgb", "rand"] {
            assert!(!table.function(name).is_some_and(|f| f.foldable), "{name} must not fold");
        }
        for name in ["abs", "sign", "sin", "atan2", "min", "max", "avg"] {
            assert!(table.function(name).is_some_and(|f| f.foldable), "{name} should fold");
        }
        assert_eq!(table.value("pi").map(ValueDef::foldability), Some(Foldability::Term));
        assert_eq!(table.value("x").map(ValueDef::foldability), Some(Foldability::CannotFold));
    }

    #[test]
    fn test_modulo_truncates_operands() {
        assert_eq!(modulo(7.9, 3.2), 1.0);
        assert_eq!(modulo(-7.0, 3.0), -1.0);
        assert!(modulo(5.0, 0.4).is_nan());
    }

    #[test]
    fn test_sign() {
        assert_eq!(sign(-3.0), -1.0);
        assert_eq!(sign(0.0), 0.0);
        assert_eq!(sign(2.5), 1.0);
    }

    #[test]
    fn test_subset_table_keeps_only_chosen_symbols() {
        let table = SymbolTable::from_symbols(
            SymbolTable::global()
                .iter()
                .filter(|symbol| !matches!(symbol, Symbol::Function(_))),
        );
        assert_eq!(table.len(), OPERATORS.len() + VALUES.len());
        assert!(table.function("sin").is_none());
        assert!(table.operator('%').is_some());
        assert!(table.iter().all(|symbol| !matches!(symbol, Symbol::Function(_))));
    }
}
