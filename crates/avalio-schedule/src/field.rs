//! Parsing of a single cron field into a bit set.

/// Bounds and aliases for one of the five cron fields.
pub(crate) struct FieldSpec {
    pub name: &'static str,
    pub min: u32,
    /// Upper end used by `*` and `a/n`.
    pub max: u32,
    /// Highest value accepted when written explicitly.
    pub value_max: u32,
    /// Names mapped to `min + index`.
    pub names: &'static [&'static str],
    /// Whether `?` is accepted as a wildcard.
    pub allow_any: bool,
}

pub(crate) const MINUTE: FieldSpec = FieldSpec {
    name: "minute",
    min: 0,
    max: 59,
    value_max: 59,
    names: &[],
    allow_any: false,
};

pub(crate) const HOUR: FieldSpec = FieldSpec {
    name: "hour",
    min: 0,
    max: 23,
    value_max: 23,
    names: &[],
    allow_any: false,
};

pub(crate) const DAY_OF_MONTH: FieldSpec = FieldSpec {
    name: "day-of-month",
    min: 1,
    max: 31,
    value_max: 31,
    names: &[],
    allow_any: true,
};

pub(crate) const MONTH: FieldSpec = FieldSpec {
    name: "month",
    min: 1,
    max: 12,
    value_max: 12,
    names: &[
        "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
    ],
    allow_any: false,
};

// 7 is accepted as Sunday and folded onto 0.
pub(crate) const DAY_OF_WEEK: FieldSpec = FieldSpec {
    name: "day-of-week",
    min: 0,
    max: 6,
    value_max: 7,
    names: &["sun", "mon", "tue", "wed", "thu", "fri", "sat"],
    allow_any: true,
};

/// Parsed field: the set of matching values plus whether it restricts
/// anything (`*`, `?` and `*/1` do not).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Field {
    bits: u64,
    restricted: bool,
}

impl Field {
    pub fn contains(&self, value: u32) -> bool {
        value < 64 && self.bits & (1 << value) != 0
    }

    pub fn is_restricted(&self) -> bool {
        self.restricted
    }

    pub fn values(&self) -> impl Iterator<Item = u32> + '_ {
        (0..64).filter(|v| self.contains(*v))
    }

    pub fn parse(expr: &str, spec: &FieldSpec) -> Result<Field, String> {
        let mut bits = 0u64;
        let mut restricted = false;

        for part in expr.split(',') {
            if part.is_empty() {
                return Err(format!("empty list item in {} field", spec.name));
            }

            let (range, step) = match part.split_once('/') {
                Some((range, step)) => {
                    let step: u32 = step
                        .parse()
                        .map_err(|_| format!("invalid step {step:?} in {} field", spec.name))?;
                    if step == 0 {
                        return Err(format!("step must be positive in {} field", spec.name));
                    }
                    (range, Some(step))
                }
                None => (part, None),
            };

            let wildcard = range == "*" || (spec.allow_any && range == "?");
            let (low, high) = if wildcard {
                (spec.min, spec.max)
            } else if let Some((a, b)) = range.split_once('-') {
                (value(a, spec)?, value(b, spec)?)
            } else {
                let v = value(range, spec)?;
                // "a/n" runs from a to the end of the field.
                if step.is_some() { (v, spec.max.max(v)) } else { (v, v) }
            };

            if low > high {
                return Err(format!(
                    "range {low}-{high} is reversed in {} field",
                    spec.name
                ));
            }

            let step = step.unwrap_or(1);
            if !wildcard || step > 1 {
                restricted = true;
            }
            for v in (low..=high).step_by(step as usize) {
                bits |= 1 << v;
            }
        }

        if spec.value_max > spec.max {
            // Fold aliases above `max` (weekday 7) back onto `min`.
            for v in spec.max + 1..=spec.value_max {
                if bits & (1 << v) != 0 {
                    bits &= !(1 << v);
                    bits |= 1 << spec.min;
                }
            }
        }

        Ok(Field { bits, restricted })
    }
}

fn value(s: &str, spec: &FieldSpec) -> Result<u32, String> {
    let lower = s.to_ascii_lowercase();
    if let Some(idx) = spec.names.iter().position(|n| *n == lower) {
        return Ok(spec.min + idx as u32);
    }
    let v: u32 = s
        .parse()
        .map_err(|_| format!("invalid value {s:?} in {} field", spec.name))?;
    if v < spec.min || v > spec.value_max {
        return Err(format!(
            "value {v} out of range {}-{} in {} field",
            spec.min, spec.value_max, spec.name
        ));
    }
    Ok(v)
}
