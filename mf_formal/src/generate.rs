//! Scenario to theory. Time is encoded with one constant per round
//! boundary: `n0` is the start of the game, `n<i+1>` the state after
//! night `i` and day `i`.

use super::*;
use mf_domain::*;

/// What the generated theory is for.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Mode {
    /// Empty goals list, Mace4 looks for models of the assumptions.
    ModelFinding,
    /// The atom becomes the single goal.
    Query(Atom),
}

/// The scenario independent part of every theory.
pub const NIGHT_AXIOMS: &[(&str, &str)] = &[
    (
        "a protect action protects its target for that night",
        "all D all Y all N (protect(D,Y,N) -> protected(Y,N))",
    ),
    (
        "nothing else is protected",
        "all Y all N (protected(Y,N) -> (exists D protect(D,Y,N)))",
    ),
    (
        "an unprotected kill target is dead at the next time point",
        "all X all Y all N all M (kill(X,Y,N) & -protected(Y,N) & next(N,M) -> -alive(Y,M))",
    ),
    (
        "a kill does not change a protected target",
        "all X all Y all N all M (kill(X,Y,N) & protected(Y,N) & alive(Y,N) & next(N,M) & -eliminated(Y,M) -> alive(Y,M))",
    ),
    (
        "everybody else alive stays alive unless voted out",
        "all Y all N all M (alive(Y,N) & next(N,M) & -(exists X (kill(X,Y,N) & -protected(Y,N))) & -eliminated(Y,M) -> alive(Y,M))",
    ),
    (
        "the dead stay dead",
        "all Y all N all M (-alive(Y,N) & next(N,M) -> -alive(Y,M))",
    ),
    (
        "a cop investigating a mafia member recognizes them",
        "all C all T all N (isCop(C) & isMafia(T) & investigate(C,T,N) -> recognizes(C,T))",
    ),
];

/// Win predicates. `mafiaWin` is a sufficient condition only.
pub const WIN_AXIOMS: &[(&str, &str)] = &[
    (
        "villagers win: no mafia alive at time N",
        "all N ((all P (isMafia(P) -> -alive(P,N))) -> villagersWin(N))",
    ),
    (
        "mafia win: every player alive at time N is mafia",
        "all N ((all P (alive(P,N) -> isMafia(P))) -> mafiaWin(N))",
    ),
];

/// Generates the theory text for a valid scenario. The same scenario
/// always gives the same text.
pub fn generate(scenario: &Scenario, mode: &Mode) -> FormalResult<String> {
    Ok(build_theory(scenario, mode)?.to_string())
}

pub fn build_theory(scenario: &Scenario, mode: &Mode) -> FormalResult<Theory> {
    let violations = validate(scenario);
    if !violations.is_empty() {
        tracing::warn!(
            "not generating a theory for scenario {}: {} violations",
            scenario.id,
            violations.len()
        );
        return Err(FormalError::InvalidScenario(violations));
    }

    let timeline = simulate(scenario);
    let times: Vec<String> = (0..=scenario.night_count).map(time_point).collect();
    let mut t = Theory {
        header: vec![
            format!("Mafia scenario {}", scenario.id),
            format!("Nights: {}", scenario.night_count),
        ],
        ..Theory::default()
    };

    t.facts.push(Statement::Comment("roles".into()));
    for p in &scenario.players {
        if let Some(role) = scenario.role_of(p) {
            t.facts
                .push(Statement::Fact(Atom::new(role.predicate(), &[p.as_str()])));
        }
    }

    t.facts.push(Statement::Comment("distinct constants".into()));
    let constants: Vec<&str> = scenario
        .players
        .iter()
        .map(|p| p.as_str())
        .chain(times.iter().map(|t| t.as_str()))
        .collect();
    for (i, x) in constants.iter().enumerate() {
        for y in &constants[i + 1..] {
            t.facts
                .push(Statement::Distinct((*x).to_owned(), (*y).to_owned()));
        }
    }

    t.facts.push(Statement::Comment("time".into()));
    for pair in times.windows(2) {
        t.facts
            .push(Statement::Fact(Atom::new("next", &[&pair[0], &pair[1]])));
    }

    t.facts.push(Statement::Comment("initial state".into()));
    for p in &scenario.players {
        t.facts
            .push(Statement::Fact(Atom::new("alive", &[p.as_str(), &times[0]])));
    }

    let mut actions: Vec<(&'static str, Vec<String>)> = vec![];
    for night in 0..scenario.night_count {
        let Some(recorded) = scenario.night(night) else {
            continue;
        };
        t.facts.push(Statement::Comment(format!("night {night}")));
        for (role, target) in recorded.targets() {
            let Some(actor) = timeline.actor(scenario, role, night) else {
                continue;
            };
            let predicate = action_predicate(role);
            let args = vec![actor.to_string(), target.to_string(), times[night].clone()];
            t.facts.push(Statement::Fact(Atom::new(
                predicate,
                &[&args[0], &args[1], &args[2]],
            )));
            actions.push((predicate, args));
        }
    }

    for (day, votes) in &scenario.day_votes {
        t.facts.push(Statement::Comment(format!(
            "day {day}, tallied outside the theory"
        )));
        let mut ordered: Vec<&Vote> = votes.iter().collect();
        ordered.sort_by_key(|v| scenario.seat(&v.voter));
        for v in ordered {
            t.facts.push(Statement::Fact(Atom::new(
                "vote",
                &[v.voter.as_str(), v.target.as_str(), &times[day + 1]],
            )));
        }
        let out = timeline
            .rounds
            .get(*day)
            .and_then(|r| r.tally.as_ref())
            .and_then(|tally| tally.eliminated.as_ref());
        if let Some(out) = out {
            let args = vec![out.to_string(), times[day + 1].clone()];
            t.facts
                .push(Statement::Fact(Atom::new("eliminated", &[&args[0], &args[1]])));
            t.facts.push(Statement::Fact(
                Atom::new("alive", &[&args[0], &args[1]]).negate(),
            ));
            actions.push(("eliminated", args));
        }
    }

    t.facts
        .push(Statement::Comment("closed world: no other actions or eliminations".into()));
    for (predicate, arity) in [("kill", 3), ("protect", 3), ("investigate", 3), ("eliminated", 2)] {
        let rows: Vec<&[String]> = actions
            .iter()
            .filter(|(p, _)| *p == predicate)
            .map(|(_, args)| args.as_slice())
            .collect();
        t.facts
            .push(Statement::Formula(completion(predicate, arity, &rows)));
    }

    push_axioms(&mut t, NIGHT_AXIOMS);
    push_axioms(&mut t, WIN_AXIOMS);

    if let Mode::Query(goal) = mode {
        t.goal(goal.clone());
    }

    tracing::debug!(
        "generated theory for scenario {}: {} facts, {} axioms",
        scenario.id,
        t.facts.len(),
        t.axioms.len()
    );
    Ok(t)
}

fn action_predicate(role: Role) -> &'static str {
    match role {
        Role::Mafia => "kill",
        Role::Doctor => "protect",
        Role::Cop => "investigate",
        Role::Villager => "vote",
    }
}

fn push_axioms(t: &mut Theory, axioms: &[(&str, &str)]) {
    for (comment, formula) in axioms {
        t.axioms.push(Statement::Comment((*comment).to_owned()));
        t.axioms.push(Statement::Formula((*formula).to_owned()));
    }
}

/// `pred(A,B,..)` holds exactly for the listed rows.
fn completion(predicate: &str, arity: usize, rows: &[&[String]]) -> String {
    let vars = &["A", "B", "C"][..arity.min(3)];
    let quantified: Vec<String> = vars.iter().map(|v| format!("all {v}")).collect();
    let atom = format!("{predicate}({})", vars.join(","));
    if rows.is_empty() {
        return format!("{} -{atom}", quantified.join(" "));
    }
    let cases: Vec<String> = rows
        .iter()
        .map(|row| {
            let eqs: Vec<String> = vars
                .iter()
                .zip(row.iter())
                .map(|(v, c)| format!("{v} = {c}"))
                .collect();
            format!("({})", eqs.join(" & "))
        })
        .collect();
    format!("{} ({atom} -> {})", quantified.join(" "), cases.join(" | "))
}

/// The theory behind a solver backed win check: roles, who is alive at
/// the state's time point, and the win axioms. Role and aliveness are
/// closed over the named players so the win predicates are decided.
pub fn win_theory(state: &GameState) -> FormalResult<Theory> {
    let problems = state.problems();
    if !problems.is_empty() {
        return Err(FormalError::InvalidState(problems.join("; ")));
    }
    let time = state.time.as_str();
    let mut t = Theory {
        header: vec![format!("Win check at {time}")],
        ..Theory::default()
    };

    t.facts.push(Statement::Comment("roles".into()));
    for p in &state.players {
        if let Some(role) = state.roles.get(p) {
            t.facts
                .push(Statement::Fact(Atom::new(role.predicate(), &[p.as_str()])));
        }
    }
    t.facts.push(Statement::Comment("distinct players".into()));
    for (i, x) in state.players.iter().enumerate() {
        for y in &state.players[i + 1..] {
            t.facts.push(Statement::Distinct(x.to_string(), y.to_string()));
        }
    }

    t.facts.push(Statement::Comment(format!("alive at {time}")));
    for p in &state.players {
        let atom = Atom::new("alive", &[p.as_str(), time]);
        if state.alive.contains(p) {
            t.facts.push(Statement::Fact(atom));
        } else {
            t.facts.push(Statement::Fact(atom.negate()));
        }
    }

    t.facts
        .push(Statement::Comment("nobody else has a role or is alive".into()));
    for role in Role::ALL {
        let holders: Vec<&Player> = state
            .players
            .iter()
            .filter(|p| state.roles.get(*p) == Some(&role))
            .collect();
        t.facts.push(Statement::Formula(closure(
            &format!("{}(P)", role.predicate()),
            &holders,
        )));
    }
    let alive: Vec<&Player> = state.players.iter().filter(|p| state.alive.contains(*p)).collect();
    t.facts
        .push(Statement::Formula(closure(&format!("alive(P,{time})"), &alive)));

    push_axioms(&mut t, WIN_AXIOMS);
    Ok(t)
}

fn closure(atom: &str, players: &[&Player]) -> String {
    if players.is_empty() {
        return format!("all P -{atom}");
    }
    let cases: Vec<String> = players.iter().map(|p| format!("P = {p}")).collect();
    format!("all P ({atom} -> {})", cases.join(" | "))
}

#[cfg(test)]
mod test_generate {
    use super::*;

    fn example() -> Scenario {
        let mut s = Scenario::from_counts(5, RoleCounts::new(1, 1, 1))
            .unwrap()
            .with_nights(2);
        s.night_actions.insert(
            0,
            NightActions::kill("d").with_protect("d").with_investigate("a"),
        );
        s.night_actions.insert(1, NightActions::kill("e").with_protect("a"));
        s.day_votes.insert(
            0,
            vec![Vote::new("e", "a"), Vote::new("a", "e"), Vote::new("b", "e")],
        );
        s
    }

    #[test]
    fn deterministic() {
        let s = example();
        let first = generate(&s, &Mode::ModelFinding).unwrap();
        let second = generate(&s, &Mode::ModelFinding).unwrap();
        assert_eq!(first, second);

        let copy = Scenario::from_json(&s.to_json().unwrap()).unwrap();
        assert_eq!(first, generate(&copy, &Mode::ModelFinding).unwrap());
    }

    #[test]
    fn facts_in_order() {
        let s = example();
        let t = build_theory(&s, &Mode::ModelFinding).unwrap();
        let facts: Vec<String> = t.atoms(Section::Facts).map(|a| a.to_string()).collect();
        println!("{:#?}", facts);
        let expected_prefix = [
            "isMafia(a)",
            "isDoctor(b)",
            "isCop(c)",
            "isVillager(d)",
            "isVillager(e)",
            "next(n0,n1)",
            "next(n1,n2)",
            "alive(a,n0)",
            "alive(b,n0)",
            "alive(c,n0)",
            "alive(d,n0)",
            "alive(e,n0)",
            "kill(a,d,n0)",
            "protect(b,d,n0)",
            "investigate(c,a,n0)",
            "kill(a,e,n1)",
            "protect(b,a,n1)",
            "vote(a,e,n1)",
            "vote(b,e,n1)",
            "vote(e,a,n1)",
            "eliminated(e,n1)",
            "-alive(e,n1)",
        ];
        assert_eq!(facts, expected_prefix);
        assert!(t.goals.is_empty());
    }

    #[test]
    fn distinct_and_closed_world() {
        let s = example();
        let text = generate(&s, &Mode::ModelFinding).unwrap();
        assert!(text.contains("a != b.\n"));
        assert!(text.contains("e != n0.\n"));
        assert!(text.contains("n1 != n2.\n"));
        assert!(text.contains(
            "all A all B all C (kill(A,B,C) -> (A = a & B = d & C = n0) | (A = a & B = e & C = n1)).\n"
        ));
        assert!(text.contains(
            "all A all B all C (investigate(A,B,C) -> (A = c & B = a & C = n0)).\n"
        ));
        assert!(text.contains("all A all B (eliminated(A,B) -> (A = e & B = n1)).\n"));
        assert!(text.contains("formulas(goals).\n% goals\nend.\n"));
    }

    #[test]
    fn untouched_players_stay_alive() {
        let mut s = Scenario::from_counts(5, RoleCounts::new(1, 1, 1))
            .unwrap()
            .with_nights(1);
        s.night_actions.insert(0, NightActions::kill("d"));
        assert!(s.simulate().is_alive(&"e".into(), 1));

        let text = generate(&s, &Mode::ModelFinding).unwrap();
        assert!(text.contains(
            "all Y all N all M (alive(Y,N) & next(N,M) & -(exists X (kill(X,Y,N) & -protected(Y,N))) & -eliminated(Y,M) -> alive(Y,M)).\n"
        ));
        assert!(text.contains("all A all B -eliminated(A,B).\n"));
        assert!(!text.contains("eliminated(e,"));
    }

    #[test]
    fn vote_outcomes_are_facts() {
        let mut s = Scenario::from_counts(5, RoleCounts::new(1, 1, 1))
            .unwrap()
            .with_nights(2);
        // a tie on day 0 eliminates nobody, c goes on day 1
        s.day_votes
            .insert(0, vec![Vote::new("a", "c"), Vote::new("c", "a")]);
        s.day_votes.insert(
            1,
            vec![Vote::new("a", "c"), Vote::new("b", "c"), Vote::new("c", "b")],
        );
        let t = build_theory(&s, &Mode::ModelFinding).unwrap();
        let eliminated: Vec<String> = t
            .atoms(Section::Facts)
            .filter(|a| a.predicate == "eliminated")
            .map(|a| a.to_string())
            .collect();
        assert_eq!(eliminated, vec!["eliminated(c,n2)"]);
        assert!(!s.simulate().is_alive(&"c".into(), 2));
        assert!(t
            .to_string()
            .contains("vote(c,b,n2).\neliminated(c,n2).\n-alive(c,n2).\n"));
    }

    #[test]
    fn axioms_do_not_depend_on_the_scenario() {
        let small = build_theory(
            &Scenario::from_counts(3, RoleCounts::new(1, 0, 0)).unwrap(),
            &Mode::ModelFinding,
        )
        .unwrap();
        let large = build_theory(&example(), &Mode::ModelFinding).unwrap();
        assert_eq!(small.axioms, large.axioms);
        assert_eq!(small.axioms.len(), 2 * (NIGHT_AXIOMS.len() + WIN_AXIOMS.len()));
        assert!(small
            .to_string()
            .contains("all A all B all C -protect(A,B,C).\n"));
    }

    #[test]
    fn query_mode_sets_the_goal() {
        let goal = Atom::new("alive", &["d", "n1"]).negate();
        let text = generate(&example(), &Mode::Query(goal)).unwrap();
        assert!(text.ends_with("formulas(goals).\n% goals\n-alive(d,n1).\nend.\n"));
    }

    #[test]
    fn invalid_scenarios_are_refused() {
        let mut s = example();
        s.day_votes.insert(1, vec![Vote::new("c", "c")]);
        match generate(&s, &Mode::ModelFinding) {
            Err(FormalError::InvalidScenario(v)) => {
                assert_eq!(
                    v,
                    vec![Violation::SelfVote {
                        day: 1,
                        voter: "c".into()
                    }]
                )
            }
            other => panic!("expected InvalidScenario, got {:?}", other),
        }
    }

    #[test]
    fn actors_follow_the_living() {
        let mut s = Scenario::from_counts(8, RoleCounts::new(2, 1, 1))
            .unwrap()
            .with_nights(2);
        s.night_actions.insert(0, NightActions::kill("a"));
        s.night_actions.insert(1, NightActions::kill("f"));
        let t = build_theory(&s, &Mode::ModelFinding).unwrap();
        let kills: Vec<String> = t
            .atoms(Section::Facts)
            .filter(|a| a.predicate == "kill")
            .map(|a| a.to_string())
            .collect();
        assert_eq!(kills, vec!["kill(a,a,n0)", "kill(b,f,n1)"]);
    }

    #[test]
    fn win_theory_closes_the_world() {
        let state = GameState {
            players: vec!["a".into(), "b".into(), "c".into()],
            roles: roles!("a" => Role::Mafia, "b" => Role::Doctor, "c" => Role::Villager),
            alive: vec!["a".into(), "c".into()],
            time: "n2".into(),
        };
        let text = win_theory(&state).unwrap().to_string();
        assert!(text.contains("alive(a,n2).\n-alive(b,n2).\nalive(c,n2).\n"));
        assert!(text.contains("all P (isMafia(P) -> P = a).\n"));
        assert!(text.contains("all P -isCop(P).\n"));
        assert!(text.contains("all P (alive(P,n2) -> P = a | P = c).\n"));
        assert!(text.contains("villagersWin(N)"));

        let mut bad = state;
        bad.alive.push("z".into());
        assert!(matches!(win_theory(&bad), Err(FormalError::InvalidState(_))));
    }
}
