//! Operator primitives over scalar values.
//!
//! Coercion rules: Int⊕Int → Int, Float anywhere → Float, Bool widens
//! to Int (0/1) then to Float. Integer-only operations reject Float.
//! Logical operators coerce both sides to Bool. Unsupported operand
//! combinations are type errors; Int division/modulo by zero is a
//! domain error, Float division follows IEEE-754.

use super::{Repr, Value, ValueType};
use crate::vm::error::VmError;

fn bool_int(v: bool) -> i64 {
    if v {
        1
    } else {
        0
    }
}

fn unsupported(op: &str, lhs: &Value, rhs: &Value) -> VmError {
    VmError::TypeError(format!(
        "unsupported operand types {} and {} for '{}'",
        lhs.tag().name(),
        rhs.tag().name(),
        op
    ))
}

fn arith(
    op: &str,
    lhs: &Value,
    rhs: &Value,
    int_op: impl Fn(i64, i64) -> Result<i64, VmError>,
    float_op: impl Fn(f64, f64) -> f64,
) -> Result<Value, VmError> {
    match (lhs.repr(), rhs.repr()) {
        (Repr::Int(l), Repr::Int(r)) => int_op(l, r).map(Value::int),
        (Repr::Float(l), Repr::Float(r)) => Ok(Value::float(float_op(l, r))),
        (Repr::Int(l), Repr::Float(r)) => Ok(Value::float(float_op(l as f64, r))),
        (Repr::Float(l), Repr::Int(r)) => Ok(Value::float(float_op(l, r as f64))),
        (Repr::Bool(l), Repr::Int(r)) => int_op(bool_int(l), r).map(Value::int),
        (Repr::Int(l), Repr::Bool(r)) => int_op(l, bool_int(r)).map(Value::int),
        (Repr::Bool(l), Repr::Float(r)) => Ok(Value::float(float_op(bool_int(l) as f64, r))),
        (Repr::Float(l), Repr::Bool(r)) => Ok(Value::float(float_op(l, bool_int(r) as f64))),
        _ => Err(unsupported(op, lhs, rhs)),
    }
}

fn int_only(
    op: &str,
    lhs: &Value,
    rhs: &Value,
    int_op: impl Fn(i64, i64) -> Result<i64, VmError>,
) -> Result<Value, VmError> {
    match (lhs.repr(), rhs.repr()) {
        (Repr::Int(l), Repr::Int(r)) => int_op(l, r).map(Value::int),
        (Repr::Bool(l), Repr::Int(r)) => int_op(bool_int(l), r).map(Value::int),
        (Repr::Int(l), Repr::Bool(r)) => int_op(l, bool_int(r)).map(Value::int),
        _ => Err(unsupported(op, lhs, rhs)),
    }
}

fn compare(
    op: &str,
    lhs: &Value,
    rhs: &Value,
    int_cmp: impl Fn(i64, i64) -> bool,
    float_cmp: impl Fn(f64, f64) -> bool,
    null_null: Option<bool>,
) -> Result<Value, VmError> {
    if lhs.tag() == ValueType::Null && rhs.tag() == ValueType::Null {
        return match null_null {
            Some(result) => Ok(Value::bool_(result)),
            None => Err(unsupported(op, lhs, rhs)),
        };
    }
    let result = match (lhs.repr(), rhs.repr()) {
        (Repr::Int(l), Repr::Int(r)) => int_cmp(l, r),
        (Repr::Float(l), Repr::Float(r)) => float_cmp(l, r),
        (Repr::Bool(l), Repr::Bool(r)) => int_cmp(bool_int(l), bool_int(r)),
        (Repr::Bool(l), Repr::Int(r)) => int_cmp(bool_int(l), r),
        (Repr::Int(l), Repr::Bool(r)) => int_cmp(l, bool_int(r)),
        (Repr::Int(l), Repr::Float(r)) => float_cmp(l as f64, r),
        (Repr::Float(l), Repr::Int(r)) => float_cmp(l, r as f64),
        (Repr::Bool(l), Repr::Float(r)) => float_cmp(bool_int(l) as f64, r),
        (Repr::Float(l), Repr::Bool(r)) => float_cmp(l, bool_int(r) as f64),
        _ => return Err(unsupported(op, lhs, rhs)),
    };
    Ok(Value::bool_(result))
}

// ==================== arithmetic ====================

pub fn add(lhs: &Value, rhs: &Value) -> Result<Value, VmError> {
    arith("+", lhs, rhs, |l, r| Ok(l.wrapping_add(r)), |l, r| l + r)
}

pub fn sub(lhs: &Value, rhs: &Value) -> Result<Value, VmError> {
    arith("-", lhs, rhs, |l, r| Ok(l.wrapping_sub(r)), |l, r| l - r)
}

pub fn mul(lhs: &Value, rhs: &Value) -> Result<Value, VmError> {
    arith("*", lhs, rhs, |l, r| Ok(l.wrapping_mul(r)), |l, r| l * r)
}

pub fn div(lhs: &Value, rhs: &Value) -> Result<Value, VmError> {
    arith(
        "/",
        lhs,
        rhs,
        |l, r| {
            if r == 0 {
                return Err(VmError::DomainError("integer division by zero".into()));
            }
            l.checked_div(r)
                .ok_or_else(|| VmError::DomainError("integer overflow in division".into()))
        },
        |l, r| l / r,
    )
}

pub fn modulo(lhs: &Value, rhs: &Value) -> Result<Value, VmError> {
    int_only("%", lhs, rhs, |l, r| {
        if r == 0 {
            return Err(VmError::DomainError("integer modulo by zero".into()));
        }
        l.checked_rem(r)
            .ok_or_else(|| VmError::DomainError("integer overflow in modulo".into()))
    })
}

// ==================== bitwise ====================

pub fn shl(lhs: &Value, rhs: &Value) -> Result<Value, VmError> {
    int_only("<<", lhs, rhs, |l, r| {
        if r < 0 {
            return Err(VmError::DomainError("negative shift amount".into()));
        }
        Ok(l.wrapping_shl(r as u32))
    })
}

pub fn shr(lhs: &Value, rhs: &Value) -> Result<Value, VmError> {
    int_only(">>", lhs, rhs, |l, r| {
        if r < 0 {
            return Err(VmError::DomainError("negative shift amount".into()));
        }
        Ok(l.wrapping_shr(r as u32))
    })
}

pub fn band(lhs: &Value, rhs: &Value) -> Result<Value, VmError> {
    int_only("&", lhs, rhs, |l, r| Ok(l & r))
}

pub fn bor(lhs: &Value, rhs: &Value) -> Result<Value, VmError> {
    int_only("|", lhs, rhs, |l, r| Ok(l | r))
}

pub fn bxor(lhs: &Value, rhs: &Value) -> Result<Value, VmError> {
    int_only("^", lhs, rhs, |l, r| Ok(l ^ r))
}

// ==================== logical ====================

pub fn land(lhs: &Value, rhs: &Value) -> Result<Value, VmError> {
    Ok(Value::bool_(lhs.to_bool()? & rhs.to_bool()?))
}

pub fn lor(lhs: &Value, rhs: &Value) -> Result<Value, VmError> {
    Ok(Value::bool_(lhs.to_bool()? | rhs.to_bool()?))
}

// ==================== comparison ====================

pub fn eq(lhs: &Value, rhs: &Value) -> Result<Value, VmError> {
    compare("==", lhs, rhs, |l, r| l == r, |l, r| l == r, Some(true))
}

pub fn ne(lhs: &Value, rhs: &Value) -> Result<Value, VmError> {
    compare("!=", lhs, rhs, |l, r| l != r, |l, r| l != r, Some(false))
}

pub fn lt(lhs: &Value, rhs: &Value) -> Result<Value, VmError> {
    compare("<", lhs, rhs, |l, r| l < r, |l, r| l < r, None)
}

pub fn le(lhs: &Value, rhs: &Value) -> Result<Value, VmError> {
    compare("<=", lhs, rhs, |l, r| l <= r, |l, r| l <= r, None)
}

pub fn gt(lhs: &Value, rhs: &Value) -> Result<Value, VmError> {
    compare(">", lhs, rhs, |l, r| l > r, |l, r| l > r, None)
}

pub fn ge(lhs: &Value, rhs: &Value) -> Result<Value, VmError> {
    compare(">=", lhs, rhs, |l, r| l >= r, |l, r| l >= r, None)
}

// ==================== unary ====================

pub fn neg(value: &Value) -> Result<Value, VmError> {
    match value.repr() {
        Repr::Int(v) => Ok(Value::int(v.wrapping_neg())),
        Repr::Float(v) => Ok(Value::float(-v)),
        _ => Err(VmError::TypeError(format!(
            "invalid operand type {} for negation",
            value.tag().name()
        ))),
    }
}

pub fn pos(value: &Value) -> Result<Value, VmError> {
    match value.repr() {
        Repr::Int(v) => Ok(Value::int(v)),
        Repr::Float(v) => Ok(Value::float(v)),
        _ => Err(VmError::TypeError(format!(
            "invalid operand type {} for unary plus",
            value.tag().name()
        ))),
    }
}

pub fn bnot(value: &Value) -> Result<Value, VmError> {
    match value.repr() {
        Repr::Int(v) => Ok(Value::int(!v)),
        Repr::Float(_) => Err(VmError::TypeError(
            "floating point is not available for bitwise not".into(),
        )),
        _ => Err(VmError::TypeError(format!(
            "invalid operand type {} for bitwise not",
            value.tag().name()
        ))),
    }
}

pub fn lnot(value: &Value) -> Result<Value, VmError> {
    match value.repr() {
        Repr::Bool(v) => Ok(Value::bool_(!v)),
        Repr::Int(v) => Ok(Value::bool_(v == 0)),
        Repr::Float(v) => Ok(Value::bool_(v == 0.0)),
        _ => Err(VmError::TypeError(format!(
            "invalid operand type {} for logical not",
            value.tag().name()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int_arithmetic_stays_int() {
        let result = add(&Value::int(2), &Value::int(3)).unwrap();
        assert_eq!(result.as_int(), Some(5));
        assert_eq!(result.tag(), ValueType::Int);
    }

    #[test]
    fn test_mixed_arithmetic_widens_to_float() {
        let result = mul(&Value::int(2), &Value::float(1.5)).unwrap();
        assert_eq!(result.as_float(), Some(3.0));
    }

    #[test]
    fn test_bool_widens_to_int() {
        let result = add(&Value::bool_(true), &Value::int(2)).unwrap();
        assert_eq!(result.as_int(), Some(3));
    }

    #[test]
    fn test_bool_pair_arithmetic_rejected() {
        assert!(add(&Value::bool_(true), &Value::bool_(true)).is_err());
    }

    #[test]
    fn test_int_division_by_zero_is_domain_error() {
        let result = div(&Value::int(1), &Value::int(0));
        assert!(matches!(result, Err(VmError::DomainError(_))));
    }

    #[test]
    fn test_float_division_by_zero_is_infinite() {
        let result = div(&Value::float(1.0), &Value::float(0.0)).unwrap();
        assert_eq!(result.as_float(), Some(f64::INFINITY));
    }

    #[test]
    fn test_modulo_rejects_float() {
        assert!(modulo(&Value::float(1.0), &Value::int(2)).is_err());
        assert!(modulo(&Value::int(7), &Value::int(3)).unwrap().as_int() == Some(1));
    }

    #[test]
    fn test_bitwise_ops_are_int_only() {
        assert_eq!(band(&Value::int(6), &Value::int(3)).unwrap().as_int(), Some(2));
        assert_eq!(bor(&Value::int(4), &Value::int(1)).unwrap().as_int(), Some(5));
        assert_eq!(bxor(&Value::int(5), &Value::int(3)).unwrap().as_int(), Some(6));
        assert_eq!(shl(&Value::int(1), &Value::int(4)).unwrap().as_int(), Some(16));
        assert_eq!(shr(&Value::int(16), &Value::int(2)).unwrap().as_int(), Some(4));
        assert!(band(&Value::float(1.0), &Value::int(1)).is_err());
    }

    #[test]
    fn test_comparison_widening() {
        assert_eq!(lt(&Value::int(1), &Value::float(1.5)).unwrap().as_bool(), Some(true));
        assert_eq!(ge(&Value::float(2.0), &Value::int(2)).unwrap().as_bool(), Some(true));
        assert_eq!(eq(&Value::bool_(true), &Value::int(1)).unwrap().as_bool(), Some(true));
    }

    #[test]
    fn test_null_equality() {
        assert_eq!(eq(&Value::null(), &Value::null()).unwrap().as_bool(), Some(true));
        assert_eq!(ne(&Value::null(), &Value::null()).unwrap().as_bool(), Some(false));
        assert!(lt(&Value::null(), &Value::null()).is_err());
        assert!(eq(&Value::null(), &Value::int(0)).is_err());
    }

    #[test]
    fn test_logical_coercion() {
        assert_eq!(
            land(&Value::int(2), &Value::bool_(true)).unwrap().as_bool(),
            Some(true)
        );
        assert_eq!(
            lor(&Value::null(), &Value::float(0.0)).unwrap().as_bool(),
            Some(false)
        );
        assert!(land(&Value::unit(), &Value::bool_(true)).is_err());
    }

    #[test]
    fn test_unary_operators() {
        assert_eq!(neg(&Value::int(5)).unwrap().as_int(), Some(-5));
        assert_eq!(neg(&Value::float(2.5)).unwrap().as_float(), Some(-2.5));
        assert_eq!(pos(&Value::int(5)).unwrap().as_int(), Some(5));
        assert_eq!(bnot(&Value::int(0)).unwrap().as_int(), Some(-1));
        assert!(bnot(&Value::float(1.0)).is_err());
        assert_eq!(lnot(&Value::int(0)).unwrap().as_bool(), Some(true));
        assert_eq!(lnot(&Value::bool_(true)).unwrap().as_bool(), Some(false));
        assert!(lnot(&Value::null()).is_err());
    }
}
