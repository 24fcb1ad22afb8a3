//! Node evaluator implementations — one per node type category.

pub mod animation;
pub mod logic;
pub mod math;
pub mod media;
pub mod time;
pub mod value;

use crate::model::value::{DataType, PortValue};

/// Folds the components of `values` pairwise with `op`.
///
/// Returns `None` when `data_type` has no numeric components.
pub(crate) fn fold_components(
    values: &[PortValue],
    data_type: DataType,
    op: impl Fn(f64, f64) -> f64,
) -> Option<PortValue> {
    data_type.component_count()?;
    let mut iter = values.iter().filter_map(PortValue::components);
    let mut acc = iter.next()?;
    for next in iter {
        for (a, b) in acc.iter_mut().zip(next) {
            *a = op(*a, b);
        }
    }
    Some(PortValue::from_components(data_type, &acc))
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::value::Point2;

    #[test]
    fn test_fold_components_sums_points() {
        let values = vec![
            PortValue::Position(Point2 { x: 1.0, y: 2.0 }),
            PortValue::Position(Point2 { x: 3.0, y: 4.0 }),
        ];
        assert_eq!(
            fold_components(&values, DataType::Position, |a, b| a + b),
            Some(PortValue::Position(Point2 { x: 4.0, y: 6.0 }))
        );
    }

    #[test]
    fn test_fold_components_rejects_discrete_types() {
        let values = vec![PortValue::Bool(true), PortValue::Bool(false)];
        assert!(fold_components(&values, DataType::Bool, |a, b| a + b).is_none());
    }
}
