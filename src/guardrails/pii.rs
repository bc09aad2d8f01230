use super::{types::CheckResult, validator::Validator};
use crate::{Result, config::PiiEntity};
use async_trait::async_trait;
use regex::{Captures, Regex};

const EMAIL_PATTERN: &str = r"(?i)\b[a-z0-9._%+-]+@[a-z0-9.-]+\.[a-z]{2,}\b";
const PHONE_PATTERN: &str =
    r"(?:\+\d{1,3}[\s.-]?)?(?:\(\d{3}\)\s?|\b\d{3}[\s.-]?)\d{3}[\s.-]?\d{4}\b";
const CREDIT_CARD_PATTERN: &str = r"\b(?:\d[ -]?){12,18}\d\b";

/// Pattern-based PII detector. Matches are replaced with `<ENTITY_NAME>`.
pub struct PiiDetector {
    // Credit cards go first so their digit runs are not mistaken for phone numbers.
    patterns: Vec<(PiiEntity, Regex)>,
}

impl PiiDetector {
    pub fn new(entities: &[PiiEntity]) -> Result<Self> {
        let mut patterns = Vec::new();
        for entity in [
            PiiEntity::CreditCard,
            PiiEntity::EmailAddress,
            PiiEntity::PhoneNumber,
        ] {
            if !entities.contains(&entity) {
                continue;
            }
            let pattern = match entity {
                PiiEntity::EmailAddress => EMAIL_PATTERN,
                PiiEntity::PhoneNumber => PHONE_PATTERN,
                PiiEntity::CreditCard => CREDIT_CARD_PATTERN,
            };
            patterns.push((entity, Regex::new(pattern)?));
        }
        Ok(Self { patterns })
    }

    /// Returns the redacted text and the entity types that were found.
    pub fn redact(&self, text: &str) -> (String, Vec<PiiEntity>) {
        let mut current = text.to_string();
        let mut found = Vec::new();

        for (entity, regex) in &self.patterns {
            let mut hit = false;
            let replaced = regex
                .replace_all(&current, |caps: &Captures| {
                    let matched = &caps[0];
                    if *entity != PiiEntity::CreditCard {
                        hit = true;
                        return format!("<{}>", entity.as_str());
                    }
                    match card_span(matched) {
                        Some((start, end)) => {
                            hit = true;
                            format!(
                                "{}<{}>{}",
                                &matched[..start],
                                entity.as_str(),
                                &matched[end..]
                            )
                        }
                        None => matched.to_string(),
                    }
                })
                .into_owned();
            if hit {
                found.push(*entity);
                current = replaced;
            }
        }

        (current, found)
    }
}

#[async_trait]
impl Validator for PiiDetector {
    fn name(&self) -> &str {
        "detect_pii"
    }

    async fn check(&self, text: &str) -> Result<CheckResult> {
        let (redacted, found) = self.redact(text);
        if found.is_empty() {
            return Ok(CheckResult::Pass);
        }

        let names: Vec<&str> = found.iter().map(PiiEntity::as_str).collect();
        Ok(CheckResult::fail(
            format!("Detected PII entities: {}", names.join(", ")),
            Some(redacted),
        ))
    }
}

/// Byte range of the longest Luhn-valid card number inside a candidate match.
///
/// The pattern is greedy and can absorb a trailing expiry or CVV group, so
/// every span that starts and ends on a digit-group edge is tried.
fn card_span(candidate: &str) -> Option<(usize, usize)> {
    let digits: Vec<usize> = candidate
        .char_indices()
        .filter(|(_, c)| c.is_ascii_digit())
        .map(|(i, _)| i)
        .collect();
    let group_start = |k: usize| k == 0 || digits[k - 1] + 1 != digits[k];
    let group_end = |k: usize| k + 1 == digits.len() || digits[k] + 1 != digits[k + 1];

    let mut best: Option<(usize, usize)> = None;
    for start in (0..digits.len()).filter(|&k| group_start(k)) {
        for end in (start..digits.len()).filter(|&k| group_end(k)) {
            let len = end - start + 1;
            if !(13..=19).contains(&len) {
                continue;
            }
            if best.is_some_and(|(s, e)| e - s + 1 >= len) {
                continue;
            }
            if luhn_valid(&candidate[digits[start]..=digits[end]]) {
                best = Some((start, end));
            }
        }
    }

    best.map(|(start, end)| (digits[start], digits[end] + 1))
}

fn luhn_valid(candidate: &str) -> bool {
    let digits: Vec<u32> = candidate.chars().filter_map(|c| c.to_digit(10)).collect();
    if !(13..=19).contains(&digits.len()) {
        return false;
    }

    let sum: u32 = digits
        .iter()
        .rev()
        .enumerate()
        .map(|(i, &d)| {
            if i % 2 == 1 {
                let doubled = d * 2;
                if doubled > 9 { doubled - 9 } else { doubled }
            } else {
                d
            }
        })
        .sum();
    sum % 10 == 0
}
