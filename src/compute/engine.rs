//! Pure arithmetic engine
//!
//! Maps an `(A, B, operator)` snapshot to a result value. No I/O, no state;
//! the service calls this synchronously after every accepted write.
//!
//! All values are IEEE-754 single-precision floats. The operator is a single
//! ASCII byte; anything outside the recognised set is rejected as
//! [`InvalidOperator`].

/// Recognised operator codes
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// `+` — A + B
    Add = b'+',
    /// `-` — A - B
    Subtract = b'-',
    /// `*` — A * B
    Multiply = b'*',
    /// `/` — A / B, with a defined divide-by-zero fallback
    Divide = b'/',
    /// `^` — A raised to the power B
    Power = b'^',
    /// `#` — the A-th root of B, i.e. B^(1/A)
    Root = b'#',
}

impl Operator {
    /// Try to convert an operator byte to an Operator
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            b'+' => Some(Self::Add),
            b'-' => Some(Self::Subtract),
            b'*' => Some(Self::Multiply),
            b'/' => Some(Self::Divide),
            b'^' => Some(Self::Power),
            b'#' => Some(Self::Root),
            _ => None,
        }
    }

    /// The wire byte for this operator
    pub fn as_byte(self) -> u8 {
        self as u8
    }
}

/// Operator byte outside the recognised set
///
/// Carries the offending byte for diagnostics. The service maps this to a
/// zero result; it is never surfaced to the peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidOperator(pub u8);

/// Compute the result for the current `(A, B, operator)` snapshot.
///
/// Divide-by-zero degrades to divisor 1 (result A) rather than faulting.
/// A root with index zero degrades the same way (result B) instead of
/// propagating infinity through `powf`.
pub fn evaluate(a: f32, b: f32, operator: u8) -> Result<f32, InvalidOperator> {
    let operator = Operator::from_byte(operator).ok_or(InvalidOperator(operator))?;

    let result = match operator {
        Operator::Add => a + b,
        Operator::Subtract => a - b,
        Operator::Multiply => a * b,
        Operator::Divide => {
            if b == 0.0 {
                a
            } else {
                a / b
            }
        }
        Operator::Power => libm::powf(a, b),
        Operator::Root => {
            if a == 0.0 {
                b
            } else {
                libm::powf(b, 1.0 / a)
            }
        }
    };

    Ok(result)
}
