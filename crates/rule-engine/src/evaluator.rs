//! 条件评估器
//!
//! 比较记录中的字段值与条件字面量。两侧必须是同一种可比较类型，
//! 不做隐式转换：字符串 `'30'` 永远不等于数值 `30`。

use crate::ast::Literal;
use crate::error::CoercionError;
use crate::models::{RecordValue, ValueKind};
use crate::operators::Operator;

/// 条件评估器
pub struct ConditionEvaluator;

impl ConditionEvaluator {
    /// 比较字段值与字面量
    ///
    /// # Arguments
    /// * `field_value` - 记录中的字段值
    /// * `operator` - 比较操作符
    /// * `literal` - 规则中的字面量
    pub fn compare(
        field_value: &RecordValue,
        operator: Operator,
        literal: &Literal,
    ) -> Result<bool, CoercionError> {
        match operator {
            Operator::Eq => Self::equals(field_value, literal),
            Operator::Neq => Self::equals(field_value, literal).map(|r| !r),
            Operator::Gt => Self::compare_numbers(field_value, operator, literal, |a, b| a > b),
            Operator::Gte => Self::compare_numbers(field_value, operator, literal, |a, b| a >= b),
            Operator::Lt => Self::compare_numbers(field_value, operator, literal, |a, b| a < b),
            Operator::Lte => Self::compare_numbers(field_value, operator, literal, |a, b| a <= b),
        }
    }

    /// 相等比较，类型不同直接报错
    fn equals(field: &RecordValue, literal: &Literal) -> Result<bool, CoercionError> {
        match (field, literal) {
            (RecordValue::Number(a), Literal::Number(b)) => Ok(a == b),
            (RecordValue::String(a), Literal::String(b)) => Ok(a == b),
            (RecordValue::Boolean(a), Literal::Boolean(b)) => Ok(a == b),
            _ => Err(CoercionError::TypeMismatch {
                field: field.kind(),
                literal: literal.kind(),
            }),
        }
    }

    /// 数值大小比较（IEEE 754 语义，NaN 与任何值比较都为 false）
    fn compare_numbers<F>(
        field: &RecordValue,
        operator: Operator,
        literal: &Literal,
        cmp: F,
    ) -> Result<bool, CoercionError>
    where
        F: Fn(f64, f64) -> bool,
    {
        match (field, literal) {
            (RecordValue::Number(a), Literal::Number(b)) => Ok(cmp(*a, *b)),
            (RecordValue::String(_), Literal::String(_)) => {
                Err(CoercionError::UnsupportedOperator {
                    operator,
                    kind: ValueKind::String,
                })
            }
            (RecordValue::Number(_), other) => Err(CoercionError::NotNumeric {
                operator,
                actual: other.kind(),
            }),
            (other, _) => Err(CoercionError::NotNumeric {
                operator,
                actual: other.kind(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(n: f64) -> RecordValue {
        RecordValue::Number(n)
    }

    fn text(s: &str) -> RecordValue {
        RecordValue::String(s.to_string())
    }

    #[test]
    fn test_numeric_ordering() {
        let thirty = Literal::Number(30.0);
        assert!(ConditionEvaluator::compare(&num(35.0), Operator::Gt, &thirty).unwrap());
        assert!(!ConditionEvaluator::compare(&num(30.0), Operator::Gt, &thirty).unwrap());
        assert!(ConditionEvaluator::compare(&num(30.0), Operator::Gte, &thirty).unwrap());
        assert!(ConditionEvaluator::compare(&num(-1.5), Operator::Lt, &thirty).unwrap());
        assert!(ConditionEvaluator::compare(&num(30.0), Operator::Lte, &thirty).unwrap());
    }

    #[test]
    fn test_nan_never_orders() {
        let zero = Literal::Number(0.0);
        for op in [Operator::Gt, Operator::Gte, Operator::Lt, Operator::Lte] {
            assert!(!ConditionEvaluator::compare(&num(f64::NAN), op, &zero).unwrap());
        }
    }

    #[test]
    fn test_equality_same_kind() {
        let sales = Literal::String("Sales".into());
        assert!(ConditionEvaluator::compare(&text("Sales"), Operator::Eq, &sales).unwrap());
        assert!(!ConditionEvaluator::compare(&text("sales"), Operator::Eq, &sales).unwrap());
        assert!(ConditionEvaluator::compare(&text("HR"), Operator::Neq, &sales).unwrap());

        assert!(
            ConditionEvaluator::compare(&num(30.0), Operator::Eq, &Literal::Number(30.0)).unwrap()
        );
        assert!(
            ConditionEvaluator::compare(
                &RecordValue::Boolean(true),
                Operator::Neq,
                &Literal::Boolean(false)
            )
            .unwrap()
        );
    }

    #[test]
    fn test_equality_kind_mismatch() {
        let err = ConditionEvaluator::compare(&text("Sales"), Operator::Eq, &Literal::Number(30.0))
            .unwrap_err();
        assert_eq!(
            err,
            CoercionError::TypeMismatch {
                field: ValueKind::String,
                literal: ValueKind::Number,
            }
        );

        // 数字字符串也不做转换
        let err = ConditionEvaluator::compare(&num(30.0), Operator::Neq, &Literal::String("30".into()))
            .unwrap_err();
        assert!(matches!(err, CoercionError::TypeMismatch { .. }));
    }

    #[test]
    fn test_ordering_requires_numbers() {
        let err = ConditionEvaluator::compare(&num(40.0), Operator::Gt, &Literal::String("old".into()))
            .unwrap_err();
        assert_eq!(
            err,
            CoercionError::NotNumeric {
                operator: Operator::Gt,
                actual: ValueKind::String,
            }
        );

        let err = ConditionEvaluator::compare(
            &RecordValue::Boolean(true),
            Operator::Lt,
            &Literal::Number(1.0),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            CoercionError::NotNumeric {
                actual: ValueKind::Boolean,
                ..
            }
        ));
    }

    #[test]
    fn test_string_ordering_unsupported() {
        let err = ConditionEvaluator::compare(&text("b"), Operator::Gte, &Literal::String("a".into()))
            .unwrap_err();
        assert_eq!(
            err,
            CoercionError::UnsupportedOperator {
                operator: Operator::Gte,
                kind: ValueKind::String,
            }
        );
    }
}
