use std::cell::OnceCell;

use log::{debug, info};

use super::context::{is_prefixed_by, is_suffixed_by};
use super::rule::{Rule, RuleIndex, RuleRecord};
use super::symbol::{Sequence, Symbol, SymbolEncoding};
use crate::error::ConfigError;
use crate::random::RandomSource;

/// Context-sensitive, stochastic, bracketed L-system.
#[derive(Debug, Clone)]
pub struct LSystem {
    encoding: SymbolEncoding,
    axiom: Sequence,
    iterations: u32,
    rules: Vec<Rule>,
    index: OnceCell<RuleIndex>,
}

impl LSystem {
    /// Validate and tokenize a rule table. Repeat notation is expanded here,
    /// so generation itself can no longer fail.
    pub fn new(
        encoding: SymbolEncoding,
        axiom: &str,
        iterations: u32,
        records: &[RuleRecord],
    ) -> Result<Self, ConfigError> {
        let axiom = encoding.parse(axiom)?;
        let rules = records
            .iter()
            .map(|record| Rule::from_record(record, encoding))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            encoding,
            axiom,
            iterations,
            rules,
            index: OnceCell::new(),
        })
    }

    pub fn encoding(&self) -> SymbolEncoding {
        self.encoding
    }

    pub fn axiom(&self) -> &Sequence {
        &self.axiom
    }

    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    fn index(&self) -> &RuleIndex {
        self.index.get_or_init(|| RuleIndex::build(&self.rules))
    }

    /// Rewrite the axiom `iterations` times.
    pub fn generate(&self, rng: &mut dyn RandomSource) -> Sequence {
        let mut current = self.axiom.clone();
        for iteration in 0..self.iterations {
            current = self.rewrite(&current, rng);
            debug!("iteration {}: {} symbols", iteration + 1, current.len());
        }
        info!(
            "generated {} symbols from {}-symbol axiom in {} iterations",
            current.len(),
            self.axiom.len(),
            self.iterations
        );
        current
    }

    /// [`generate`](Self::generate) rendered back to text.
    pub fn generate_text(&self, rng: &mut dyn RandomSource) -> String {
        self.generate(rng).to_string()
    }

    /// One parallel rewrite pass over `input`.
    pub fn rewrite(&self, input: &[Symbol], rng: &mut dyn RandomSource) -> Sequence {
        let mut output = Sequence::with_capacity(input.len() * 2);
        for (i, &symbol) in input.iter().enumerate() {
            match self.select_rule(input, i, rng) {
                Some(rule) => output.extend_from_slice(&rule.replacement),
                None => output.push(symbol),
            }
        }
        output
    }

    /// The rule rewriting `input[index]`, or `None` to pass it through.
    fn select_rule(&self, input: &[Symbol], index: usize, rng: &mut dyn RandomSource) -> Option<&Rule> {
        let candidates = self.index().candidates(input[index]);
        let selected = self.highest_priority_match(candidates, input, index)?;

        let kind: Vec<&Rule> = candidates
            .iter()
            .map(|&i| &self.rules[i])
            .filter(|rule| rule.same_kind(selected))
            .collect();

        if kind.len() == 1 {
            return Some(selected);
        }
        pick_weighted(&kind, rng)
    }

    fn highest_priority_match(&self, candidates: &[usize], input: &[Symbol], index: usize) -> Option<&Rule> {
        candidates
            .iter()
            .map(|&i| &self.rules[i])
            .find(|rule| {
                (rule.prefix.is_empty() || is_prefixed_by(input, index, &rule.prefix))
                    && (rule.suffix.is_empty() || is_suffixed_by(input, index, &rule.suffix))
            })
    }
}

/// Draw `r` in `[0, Σw)` and return the first rule whose weight covers the
/// remainder. Rounding that runs past the end picks the last rule.
fn pick_weighted<'a>(kind: &[&'a Rule], rng: &mut dyn RandomSource) -> Option<&'a Rule> {
    let total: f32 = kind.iter().map(|rule| rule.weight).sum();
    let mut remainder = rng.range(0.0, total);

    for &rule in kind {
        if remainder <= rule.weight {
            return Some(rule);
        }
        remainder -= rule.weight;
    }
    kind.last().copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::{ScriptedRandom, SeededRandom};

    fn lsystem(axiom: &str, iterations: u32, rules: Vec<RuleRecord>) -> LSystem {
        LSystem::new(SymbolEncoding::SingleChar, axiom, iterations, &rules).unwrap()
    }

    fn run(system: &LSystem) -> String {
        system.generate_text(&mut SeededRandom::new(1))
    }

    fn algae() -> Vec<RuleRecord> {
        vec![RuleRecord::new("A", "AB"), RuleRecord::new("B", "A")]
    }

    #[test]
    fn test_zero_iterations_returns_axiom() {
        let system = lsystem("A[B]C", 0, algae());
        assert_eq!(run(&system), "A[B]C");
    }

    #[test]
    fn test_context_free_generations() {
        assert_eq!(run(&lsystem("A", 1, algae())), "AB");
        assert_eq!(run(&lsystem("A", 2, algae())), "ABA");
        assert_eq!(run(&lsystem("A", 3, algae())), "ABAAB");
    }

    #[test]
    fn test_prefix_rule_overrides_plain_rule() {
        let rules = vec![
            RuleRecord::new("A", "AB"),
            RuleRecord::new("B", "A"),
            RuleRecord::with_context("B", "C", "", "D"),
            RuleRecord::new("D", "X"),
        ];
        assert_eq!(run(&lsystem("AC", 2, rules)), "ABAD");
    }

    #[test]
    fn test_suffix_rule_after_prefix_rule() {
        let rules = vec![
            RuleRecord::new("A", "AB"),
            RuleRecord::new("B", "A"),
            RuleRecord::with_context("B", "C", "", "D"),
            RuleRecord::new("D", "X"),
            RuleRecord::with_context("", "A", "D", "F"),
        ];
        assert_eq!(run(&lsystem("AC", 3, rules)), "ABAFX");
    }

    #[test]
    fn test_signal_propagates_one_step_per_generation() {
        let rules = vec![
            RuleRecord::with_context("B", "A", "", "B"),
            RuleRecord::new("B", "A"),
        ];
        assert_eq!(run(&lsystem("BAAAAAAAA", 4, rules)), "AAAABAAAA");
    }

    #[test]
    fn test_bracketed_context() {
        let rules = vec![
            RuleRecord::new("A", "AB"),
            RuleRecord::new("B", "A[C]B"),
            RuleRecord::new("C", "B"),
            RuleRecord::with_context("", "B", "B", "X"),
        ];
        assert_eq!(run(&lsystem("A[B]C", 2, rules)), "ABX[AB[B]A[C]B]A[C]B");
    }

    #[test]
    fn test_unmatched_symbols_pass_through() {
        let system = lsystem("F+[-G]", 3, vec![RuleRecord::with_context("Q", "F", "", "X")]);
        assert_eq!(run(&system), "F+[-G]");
    }

    #[test]
    fn test_repeat_notation_in_replacement() {
        let system = lsystem("A", 1, vec![RuleRecord::new("A", "F{3}[+A]")]);
        assert_eq!(run(&system), "FFF[+A]");
    }

    #[test]
    fn test_malformed_rule_fails_construction() {
        let err = LSystem::new(
            SymbolEncoding::SingleChar,
            "A",
            1,
            &[RuleRecord::new("A", "F{}")],
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::MalformedRepeat { .. }));
    }

    #[test]
    fn test_indexed_encoding_rewrites_whole_symbols() {
        let rules = vec![
            RuleRecord::new("A1", "A2[F]"),
            RuleRecord::new("A2", "A1F"),
        ];
        let system = LSystem::new(SymbolEncoding::Indexed, "A1", 2, &rules).unwrap();
        assert_eq!(run(&system), "A1F[F]");

        // Same text under single-char encoding: `1`/`2` are separate symbols
        // and `A1` is not a valid predecessor.
        assert!(LSystem::new(SymbolEncoding::SingleChar, "A1", 2, &rules).is_err());
    }

    #[test]
    fn test_weighted_pick_follows_draw() {
        let rules = vec![
            RuleRecord::new("A", "X").with_weight(1.0),
            RuleRecord::new("A", "Y").with_weight(3.0),
        ];
        let system = lsystem("A", 1, rules);

        // total weight 4: draws 0.0 and 1.0 land on X, anything above on Y
        assert_eq!(system.generate_text(&mut ScriptedRandom::new([0.0])), "X");
        assert_eq!(system.generate_text(&mut ScriptedRandom::new([0.25])), "X");
        assert_eq!(system.generate_text(&mut ScriptedRandom::new([0.3])), "Y");
        assert_eq!(system.generate_text(&mut ScriptedRandom::new([0.99])), "Y");
    }

    #[test]
    fn test_weighted_pick_redrawn_per_occurrence() {
        let rules = vec![RuleRecord::new("A", "X"), RuleRecord::new("A", "Y")];
        let system = lsystem("AAAA", 1, rules);
        let mut rng = ScriptedRandom::new([0.1, 0.9]);
        assert_eq!(system.generate_text(&mut rng), "XYXY");
    }

    #[test]
    fn test_kind_excludes_rules_with_other_context() {
        let rules = vec![
            RuleRecord::new("A", "X"),
            RuleRecord::with_context("B", "A", "", "Y"),
            RuleRecord::with_context("B", "A", "", "Z"),
        ];
        let system = lsystem("BA", 1, rules);
        // context rules win and only they are drawn from
        assert_eq!(system.generate_text(&mut ScriptedRandom::new([0.0])), "BY");
        assert_eq!(system.generate_text(&mut ScriptedRandom::new([0.9])), "BZ");
    }

    #[test]
    fn test_weighted_frequencies_converge() {
        let rules = vec![
            RuleRecord::new("A", "X").with_weight(1.0),
            RuleRecord::new("A", "Y").with_weight(2.0),
            RuleRecord::new("A", "Z").with_weight(5.0),
        ];
        let draws = 8000;
        let system = lsystem(&"A".repeat(draws), 1, rules);
        let out = system.generate_text(&mut SeededRandom::new(2024));

        let freq = |c: char| out.chars().filter(|&x| x == c).count() as f32 / draws as f32;
        assert!((freq('X') - 1.0 / 8.0).abs() < 0.02, "X: {}", freq('X'));
        assert!((freq('Y') - 2.0 / 8.0).abs() < 0.02, "Y: {}", freq('Y'));
        assert!((freq('Z') - 5.0 / 8.0).abs() < 0.02, "Z: {}", freq('Z'));
    }

    #[test]
    fn test_seeded_runs_are_reproducible() {
        let rules = vec![
            RuleRecord::new("F", "F[+F]F").with_weight(1.0),
            RuleRecord::new("F", "F[-F]F").with_weight(1.0),
            RuleRecord::new("F", "FF").with_weight(0.5),
        ];
        let system = lsystem("F", 3, rules);
        let a = system.generate_text(&mut SeededRandom::new(5));
        let b = system.generate_text(&mut SeededRandom::new(5));
        assert_eq!(a, b);
    }
}
