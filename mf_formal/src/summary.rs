use super::*;
use std::fmt;

/// Restricts one argument position of a queried predicate.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum ArgPattern {
    Any,
    Element(usize),
    Constant(String),
}

impl ArgPattern {
    /// `_` or `*` for any, digits for an element, anything else is a constant.
    pub fn parse(s: &str) -> Self {
        let s = s.trim();
        match s {
            "_" | "*" => ArgPattern::Any,
            _ => match s.parse() {
                Ok(e) => ArgPattern::Element(e),
                Err(_) => ArgPattern::Constant(s.to_owned()),
            },
        }
    }

    fn element(&self, model: &StructuredModel) -> Option<Option<usize>> {
        match self {
            ArgPattern::Any => Some(None),
            ArgPattern::Element(e) => Some(Some(*e)),
            ArgPattern::Constant(c) => model.element_of(c).map(Some),
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Fact {
    pub predicate: String,
    pub tuple: Vec<usize>,
    /// Per argument: the constants naming the element, or its ordinal.
    pub labels: Vec<String>,
    pub value: bool,
}

impl fmt::Display for Fact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.value {
            write!(f, "-")?;
        }
        if self.labels.is_empty() {
            write!(f, "{}", self.predicate)
        } else {
            write!(f, "{}({})", self.predicate, self.labels.join(","))
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Summary {
    Facts(Vec<Fact>),
    /// The model has no table for the predicate.
    NotFound,
}

impl Summary {
    pub fn facts(&self) -> &[Fact] {
        match self {
            Summary::Facts(f) => f,
            Summary::NotFound => &[],
        }
    }
}

fn label(model: &StructuredModel, element: usize) -> String {
    let names = model.constants_of(element);
    if names.is_empty() {
        element.to_string()
    } else {
        names.join("=")
    }
}

/// Lists the table of `predicate` restricted to `pattern`, ordered by the
/// first argument, then the rest. Missing pattern positions match anything.
pub fn summarize(model: &StructuredModel, predicate: &str, pattern: &[ArgPattern]) -> Summary {
    let Some(relation) = model.relation(predicate) else {
        return Summary::NotFound;
    };
    if pattern.len() > relation.arity {
        return Summary::Facts(vec![]);
    }
    let mut wanted = vec![None; relation.arity];
    for (slot, p) in wanted.iter_mut().zip(pattern) {
        match p.element(model) {
            Some(e) => *slot = e,
            // an unknown constant names no element
            None => return Summary::Facts(vec![]),
        }
    }

    let facts = relation
        .tuples
        .iter()
        .filter(|(tuple, _)| {
            tuple
                .iter()
                .zip(&wanted)
                .all(|(e, w)| w.map_or(true, |w| w == *e))
        })
        .map(|(tuple, value)| Fact {
            predicate: predicate.to_owned(),
            tuple: tuple.clone(),
            labels: tuple.iter().map(|e| label(model, *e)).collect(),
            value: *value,
        })
        .collect();
    Summary::Facts(facts)
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Lookup {
    True,
    False,
    NotFound,
}

/// Looks up one ground atom given by constant names, such as
/// `holds(model, "alive", &["d", "n1"])`.
pub fn holds(model: &StructuredModel, predicate: &str, constants: &[&str]) -> Lookup {
    let Some(relation) = model.relation(predicate) else {
        return Lookup::NotFound;
    };
    if relation.arity != constants.len() {
        return Lookup::NotFound;
    }
    let tuple: Option<Vec<usize>> = constants.iter().map(|c| model.element_of(c)).collect();
    match tuple {
        Some(t) if relation.value(&t) => Lookup::True,
        Some(_) => Lookup::False,
        None => Lookup::NotFound,
    }
}

impl fmt::Display for StructuredModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "domain size {}", self.domain_size)?;
        for e in 0..self.domain_size {
            let names = self.constants_of(e);
            if !names.is_empty() {
                writeln!(f, "  {} = {}", e, names.join(", "))?;
            }
        }
        for name in self.relations.keys() {
            let true_facts: Vec<String> = summarize(self, name, &[])
                .facts()
                .iter()
                .filter(|fact| fact.value)
                .map(|fact| fact.to_string())
                .collect();
            writeln!(f, "{}: {}", name, true_facts.join(" "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test_summary {
    use super::*;
    use mf_domain::{NightActions, RoleCounts, Scenario};
    use std::collections::BTreeMap;

    // one night, mafia a kills d, nobody protects
    fn after_kill() -> StructuredModel {
        let mut m = StructuredModel::new(4);
        for (c, e) in [("a", 0), ("d", 1), ("n0", 2), ("n1", 3)] {
            m.constants.insert(c.to_owned(), e);
        }
        let mut alive = BTreeMap::new();
        for p in 0..4 {
            for t in 0..4 {
                alive.insert(vec![p, t], t == 2 || (t == 3 && p == 0));
            }
        }
        m.relations.insert("alive".into(), Relation { arity: 2, tuples: alive });
        m
    }

    #[test]
    fn killed_player_is_not_alive_after_the_night() {
        let mut s = Scenario::from_counts(4, RoleCounts::new(1, 1, 0))
            .unwrap()
            .with_nights(1);
        s.night_actions.insert(0, NightActions::kill("d"));
        assert!(!s.simulate().is_alive(&"d".into(), 1));

        let m = after_kill();
        assert_eq!(holds(&m, "alive", &["d", "n1"]), Lookup::False);
        assert_eq!(holds(&m, "alive", &["d", "n0"]), Lookup::True);
        assert_eq!(holds(&m, "alive", &["a", "n1"]), Lookup::True);
        assert_eq!(holds(&m, "alive", &["zed", "n1"]), Lookup::NotFound);
        assert_eq!(holds(&m, "kill", &["a", "d", "n0"]), Lookup::NotFound);

        let at_n1 = summarize(
            &m,
            "alive",
            &[ArgPattern::Constant("d".into()), ArgPattern::Constant("n1".into())],
        );
        let rendered: Vec<String> = at_n1.facts().iter().map(|f| f.to_string()).collect();
        assert_eq!(rendered, vec!["-alive(d,n1)"]);
    }

    #[test]
    fn patterns_and_order() {
        let m = after_kill();
        let s = summarize(&m, "alive", &[ArgPattern::Any, ArgPattern::Constant("n1".into())]);
        let rendered: Vec<String> = s.facts().iter().map(|f| f.to_string()).collect();
        assert_eq!(
            rendered,
            vec!["alive(a,n1)", "-alive(d,n1)", "-alive(n0,n1)", "-alive(n1,n1)"]
        );

        let s = summarize(&m, "alive", &[ArgPattern::Element(1)]);
        assert_eq!(s.facts().len(), 4);
        assert!(s.facts().windows(2).all(|w| w[0].tuple < w[1].tuple));

        assert_eq!(summarize(&m, "vote", &[]), Summary::NotFound);
        assert_eq!(
            summarize(&m, "alive", &[ArgPattern::Constant("zed".into())]),
            Summary::Facts(vec![])
        );
    }

    #[test]
    fn shared_elements_and_parsing_patterns() {
        let mut m = after_kill();
        m.constants.insert("b".into(), 0);
        let s = summarize(&m, "alive", &[ArgPattern::Element(0), ArgPattern::Element(3)]);
        assert_eq!(s.facts()[0].to_string(), "alive(a=b,n1)");

        assert_eq!(ArgPattern::parse("_"), ArgPattern::Any);
        assert_eq!(ArgPattern::parse(" 2"), ArgPattern::Element(2));
        assert_eq!(ArgPattern::parse("d"), ArgPattern::Constant("d".into()));
        println!("{}", m);
    }
}
