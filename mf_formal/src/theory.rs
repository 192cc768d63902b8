use super::*;
use chrono::{DateTime, TimeZone};
use std::fmt;
use uuid::Uuid;

/// A possibly negated ground atom such as `alive(d,n1)` or `-alive(d,n1)`.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone)]
pub struct Atom {
    pub negated: bool,
    pub predicate: String,
    pub args: Vec<String>,
}

impl Atom {
    pub fn new(predicate: &str, args: &[&str]) -> Self {
        Atom {
            negated: false,
            predicate: predicate.to_owned(),
            args: args.iter().map(|a| (*a).to_owned()).collect(),
        }
    }

    pub fn negate(mut self) -> Self {
        self.negated = !self.negated;
        self
    }

    pub fn parse(s: &str) -> FormalResult<Self> {
        let (negated, predicate, args) =
            grammar::mace4_line::atom(s).map_err(|_| FormalError::BadAtom(s.to_owned()))?;
        let upper = |x: &str| x.starts_with(|c: char| c.is_ascii_uppercase());
        if upper(predicate) || args.iter().any(|a| upper(*a)) {
            // upper case names are variables, not constants
            return Err(FormalError::BadAtom(s.to_owned()));
        }
        Ok(Atom {
            negated,
            predicate: predicate.to_owned(),
            args: args.into_iter().map(|a| a.to_owned()).collect(),
        })
    }
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negated {
            write!(f, "-")?;
        }
        if self.args.is_empty() {
            write!(f, "{}", self.predicate)
        } else {
            write!(f, "{}({})", self.predicate, self.args.join(","))
        }
    }
}

/// One line of a formula list.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Statement {
    Fact(Atom),
    Distinct(String, String),
    Formula(String),
    Comment(String),
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Statement::Fact(a) => write!(f, "{a}."),
            Statement::Distinct(x, y) => write!(f, "{x} != {y}."),
            Statement::Formula(s) => write!(f, "{s}."),
            Statement::Comment(c) => write!(f, "% {c}"),
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Section {
    Facts,
    Axioms,
    Goals,
}

impl Section {
    pub fn name(&self) -> &'static str {
        match self {
            Section::Facts => "facts",
            Section::Axioms => "axioms",
            Section::Goals => "goals",
        }
    }
}

/// A theory in Prover9/Mace4 input syntax. Facts and axioms go to the
/// assumptions list, goals to the goals list.
#[derive(Debug, PartialEq, Eq, Clone, Default)]
pub struct Theory {
    pub header: Vec<String>,
    pub facts: Vec<Statement>,
    pub axioms: Vec<Statement>,
    pub goals: Vec<Statement>,
}

impl Theory {
    pub fn section(&self, section: Section) -> &[Statement] {
        match section {
            Section::Facts => &self.facts,
            Section::Axioms => &self.axioms,
            Section::Goals => &self.goals,
        }
    }

    pub fn push(&mut self, section: Section, statement: Statement) {
        match section {
            Section::Facts => self.facts.push(statement),
            Section::Axioms => self.axioms.push(statement),
            Section::Goals => self.goals.push(statement),
        }
    }

    /// Adds a ground atom to the assumptions. Mace4 then looks for a model
    /// in which the atom holds.
    pub fn assume(&mut self, atom: Atom) {
        self.facts.push(Statement::Comment("query".into()));
        self.facts.push(Statement::Fact(atom));
    }

    pub fn goal(&mut self, atom: Atom) {
        self.goals.push(Statement::Fact(atom));
    }

    /// Ground atoms of one section, in order.
    pub fn atoms(&self, section: Section) -> impl Iterator<Item = &Atom> {
        self.section(section).iter().filter_map(|s| match s {
            Statement::Fact(a) => Some(a),
            _ => None,
        })
    }
}

impl fmt::Display for Theory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for h in &self.header {
            writeln!(f, "% {h}")?;
        }
        if !self.header.is_empty() {
            writeln!(f)?;
        }
        writeln!(f, "formulas(assumptions).")?;
        for section in [Section::Facts, Section::Axioms] {
            writeln!(f, "% {}", section.name())?;
            for s in self.section(section) {
                writeln!(f, "{s}")?;
            }
        }
        writeln!(f, "end.")?;
        writeln!(f)?;
        writeln!(f, "formulas(goals).")?;
        writeln!(f, "% {}", Section::Goals.name())?;
        for s in &self.goals {
            writeln!(f, "{s}")?;
        }
        writeln!(f, "end.")
    }
}

/// Inserts `atom` as the last assumption of an existing theory text.
pub fn insert_assumption(text: &str, atom: &Atom) -> FormalResult<String> {
    let marker = "formulas(assumptions).";
    let start = text
        .find(marker)
        .ok_or_else(|| FormalError::MalformedTheory(format!("no '{marker}' list")))?;
    let mut offset = start + marker.len();
    let mut end = None;
    for line in text[offset..].split_inclusive('\n') {
        if line.trim() == "end." {
            end = Some(offset);
            break;
        }
        offset += line.len();
    }
    let end = end.ok_or_else(|| {
        FormalError::MalformedTheory("assumptions list is never closed with 'end.'".into())
    })?;

    let mut out = String::with_capacity(text.len() + 32);
    out.push_str(&text[..end]);
    if !out.ends_with('\n') {
        out.push('\n');
    }
    out.push_str(&format!("{atom}.\n"));
    out.push_str(&text[end..]);
    Ok(out)
}

/// `mafia_<scenario id>_<YYYYmmdd_HHMMSS>.in`
pub fn theory_file_name<Tz: TimeZone>(id: &Uuid, at: &DateTime<Tz>) -> String
where
    Tz::Offset: fmt::Display,
{
    format!("mafia_{}_{}.in", id.to_simple(), at.format("%Y%m%d_%H%M%S"))
}

#[cfg(test)]
mod test_theory {
    use super::*;
    use chrono::Utc;

    #[test]
    fn atoms_round_trip_through_text() {
        let a = Atom::new("alive", &["d", "n1"]);
        assert_eq!(a.to_string(), "alive(d,n1)");
        assert_eq!(a.clone().negate().to_string(), "-alive(d,n1)");
        assert_eq!(Atom::parse("-alive(d, n1)").unwrap(), a.negate());
        assert_eq!(Atom::new("mafiaWin", &[]).to_string(), "mafiaWin");
        assert!(Atom::parse("alive(X,n1)").is_err());
        assert!(Atom::parse("alive(d,n1) | p").is_err());
    }

    #[test]
    fn layout() {
        let mut t = Theory {
            header: vec!["test".into()],
            ..Theory::default()
        };
        t.push(Section::Facts, Statement::Fact(Atom::new("isMafia", &["a"])));
        t.push(Section::Facts, Statement::Distinct("a".into(), "b".into()));
        t.push(
            Section::Axioms,
            Statement::Formula("all X (isMafia(X) -> -isCop(X))".into()),
        );
        t.goal(Atom::new("isMafia", &["a"]));
        let expected = "% test\n\
                        \n\
                        formulas(assumptions).\n\
                        % facts\n\
                        isMafia(a).\n\
                        a != b.\n\
                        % axioms\n\
                        all X (isMafia(X) -> -isCop(X)).\n\
                        end.\n\
                        \n\
                        formulas(goals).\n\
                        % goals\n\
                        isMafia(a).\n\
                        end.\n";
        assert_eq!(t.to_string(), expected);
        assert_eq!(t.atoms(Section::Facts).count(), 1);
    }

    #[test]
    fn insert_into_existing_text() {
        let text = "formulas(assumptions).\nisMafia(a).\nend.\n\nformulas(goals).\nend.\n";
        let out = insert_assumption(text, &Atom::new("alive", &["a", "n1"])).unwrap();
        assert_eq!(
            out,
            "formulas(assumptions).\nisMafia(a).\nalive(a,n1).\nend.\n\nformulas(goals).\nend.\n"
        );
        assert!(insert_assumption("formulas(goals).\nend.\n", &Atom::new("p", &[])).is_err());
        assert!(insert_assumption("formulas(assumptions).\np.\n", &Atom::new("p", &[])).is_err());
    }

    #[test]
    fn file_names() {
        let id = Uuid::nil();
        let at = Utc.ymd(2024, 3, 5).and_hms(14, 7, 9);
        assert_eq!(
            theory_file_name(&id, &at),
            "mafia_00000000000000000000000000000000_20240305_140709.in"
        );
    }
}
