//! Prometheus function signatures
//!
//! Argument and return types of the built-in functions, used to describe calls
//! and to tell range-vector functions apart from instant-vector ones.

use crate::ast::{Func, ValueType};

use ValueType::{Matrix, Scalar, String as Str, Vector};

type Signature = (&'static str, &'static [ValueType], i32, ValueType);

/// Sorted by name
const SIGNATURES: &[Signature] = &[
    ("abs", &[Vector], 0, Vector),
    ("absent", &[Vector], 0, Vector),
    ("absent_over_time", &[Matrix], 0, Vector),
    ("acos", &[Vector], 0, Vector),
    ("acosh", &[Vector], 0, Vector),
    ("asin", &[Vector], 0, Vector),
    ("asinh", &[Vector], 0, Vector),
    ("atan", &[Vector], 0, Vector),
    ("atanh", &[Vector], 0, Vector),
    ("avg_over_time", &[Matrix], 0, Vector),
    ("ceil", &[Vector], 0, Vector),
    ("changes", &[Matrix], 0, Vector),
    ("clamp", &[Vector, Scalar, Scalar], 0, Vector),
    ("clamp_max", &[Vector, Scalar], 0, Vector),
    ("clamp_min", &[Vector, Scalar], 0, Vector),
    ("cos", &[Vector], 0, Vector),
    ("cosh", &[Vector], 0, Vector),
    ("count_over_time", &[Matrix], 0, Vector),
    ("day_of_month", &[Vector], 1, Vector),
    ("day_of_week", &[Vector], 1, Vector),
    ("day_of_year", &[Vector], 1, Vector),
    ("days_in_month", &[Vector], 1, Vector),
    ("deg", &[Vector], 0, Vector),
    ("delta", &[Matrix], 0, Vector),
    ("deriv", &[Matrix], 0, Vector),
    ("double_exponential_smoothing", &[Matrix, Scalar, Scalar], 0, Vector),
    ("exp", &[Vector], 0, Vector),
    ("floor", &[Vector], 0, Vector),
    ("histogram_avg", &[Vector], 0, Vector),
    ("histogram_count", &[Vector], 0, Vector),
    ("histogram_fraction", &[Scalar, Scalar, Vector], 0, Vector),
    ("histogram_quantile", &[Scalar, Vector], 0, Vector),
    ("histogram_stddev", &[Vector], 0, Vector),
    ("histogram_stdvar", &[Vector], 0, Vector),
    ("histogram_sum", &[Vector], 0, Vector),
    ("hour", &[Vector], 1, Vector),
    ("idelta", &[Matrix], 0, Vector),
    ("increase", &[Matrix], 0, Vector),
    ("irate", &[Matrix], 0, Vector),
    ("label_join", &[Vector, Str, Str, Str], -1, Vector),
    ("label_replace", &[Vector, Str, Str, Str, Str], 0, Vector),
    ("last_over_time", &[Matrix], 0, Vector),
    ("ln", &[Vector], 0, Vector),
    ("log10", &[Vector], 0, Vector),
    ("log2", &[Vector], 0, Vector),
    ("mad_over_time", &[Matrix], 0, Vector),
    ("max_over_time", &[Matrix], 0, Vector),
    ("min_over_time", &[Matrix], 0, Vector),
    ("minute", &[Vector], 1, Vector),
    ("month", &[Vector], 1, Vector),
    ("pi", &[], 0, Scalar),
    ("predict_linear", &[Matrix, Scalar], 0, Vector),
    ("present_over_time", &[Matrix], 0, Vector),
    ("quantile_over_time", &[Scalar, Matrix], 0, Vector),
    ("rad", &[Vector], 0, Vector),
    ("rate", &[Matrix], 0, Vector),
    ("resets", &[Matrix], 0, Vector),
    ("round", &[Vector, Scalar], 1, Vector),
    ("scalar", &[Vector], 0, Scalar),
    ("sgn", &[Vector], 0, Vector),
    ("sin", &[Vector], 0, Vector),
    ("sinh", &[Vector], 0, Vector),
    ("sort", &[Vector], 0, Vector),
    ("sort_by_label", &[Vector, Str], -1, Vector),
    ("sort_by_label_desc", &[Vector, Str], -1, Vector),
    ("sort_desc", &[Vector], 0, Vector),
    ("sqrt", &[Vector], 0, Vector),
    ("stddev_over_time", &[Matrix], 0, Vector),
    ("stdvar_over_time", &[Matrix], 0, Vector),
    ("sum_over_time", &[Matrix], 0, Vector),
    ("tan", &[Vector], 0, Vector),
    ("tanh", &[Vector], 0, Vector),
    ("time", &[], 0, Scalar),
    ("timestamp", &[Vector], 0, Vector),
    ("vector", &[Scalar], 0, Vector),
    ("year", &[Vector], 1, Vector),
];

/// Signature of the built-in function `name`
pub fn signature(name: &str) -> Option<Func> {
    SIGNATURES
        .binary_search_by(|(candidate, ..)| (*candidate).cmp(name))
        .ok()
        .map(|idx| {
            let (name, arg_types, variadic, return_type) = SIGNATURES[idx];
            Func {
                name: name.to_string(),
                arg_types: arg_types.to_vec(),
                variadic,
                return_type,
            }
        })
}

/// Names of all built-in functions, sorted
pub fn names() -> impl Iterator<Item = &'static str> {
    SIGNATURES.iter().map(|(name, ..)| *name)
}
