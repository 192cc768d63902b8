use mf_domain::*;
use mf_formal::*;
use mf_runner::*;

#[test]
fn play_until_the_villagers_win() {
    // a, b mafia; c doctor; d cop; e..h villagers
    let mut g = GameSession::deal(8, Some(RoleCounts::new(2, 1, 1))).unwrap();

    g.play_night(NightActions::kill("d").with_protect("d").with_investigate("b"))
        .unwrap();
    assert_eq!(g.recognized(), vec![("d".into(), "b".into())]);
    for voter in ["c", "d", "e", "f", "g"] {
        g.cast_vote(voter, "b").unwrap();
    }
    g.cast_vote("b", "d").unwrap();
    assert_eq!(g.tally_day().unwrap().eliminated, Some("b".into()));
    assert_eq!(g.pending_voters(), vec![Player::from("a"), Player::from("h")]);

    let out = g.play_night(NightActions::kill("e")).unwrap();
    assert_eq!(out.killed, Some("e".into()));
    assert!(g.pending_voters().contains(&Player::from("a")));
    for voter in ["c", "d", "f"] {
        g.cast_vote(voter, "a").unwrap();
    }
    assert_eq!(g.verdict(), Verdict::Villagers);

    // the finished game still encodes, with every round in it
    let text = generate(&g.scenario, &Mode::ModelFinding).unwrap();
    assert!(text.contains("kill(a,d,n0)."));
    assert!(text.contains("kill(a,e,n1)."));
    assert!(text.contains("vote(c,a,n2)."));
}

#[test]
fn suggestions_follow_the_game() {
    let mut g = GameSession::deal(6, Some(RoleCounts::new(1, 1, 1))).unwrap();
    g.play_night(NightActions::kill("c")).unwrap();

    let mafia = suggest(&g, "a").unwrap();
    assert_eq!(mafia[0].to_string(), "kill b, the last doctor");
    assert!(mafia
        .iter()
        .all(|s| !matches!(s, Suggestion::Kill { target, .. } if target.as_str() == "c")));
    assert!(suggest(&g, "c").is_err());

    let (night, atom) = mafia[0].hypothetical(&g, &"a".into());
    assert_eq!(night, NightActions::kill("b"));
    assert_eq!(atom.to_string(), "-alive(b,n2)");
}

#[test]
fn bad_moves_are_bad_input() {
    let mut g = GameSession::deal(5, None).unwrap();
    let err = g.play_night(NightActions::kill("nobody")).unwrap_err();
    assert!(err.is_bad_input());
    let err = suggest(&g, "nobody").unwrap_err();
    assert!(err.is_bad_input());
}

#[test]
fn invalid_scenarios_never_reach_the_solver() {
    let session = SolverSession::new(Mace4 {
        path: "mace4".into(),
        config: SolverConfig::default(),
    });
    let mut scenario = Scenario::from_counts(4, RoleCounts::default_for(4))
        .unwrap()
        .with_nights(1);
    scenario.day_votes.insert(0, vec![Vote::new("b", "b")]);

    let err = tokio_test::block_on(session.find_model(&scenario)).unwrap_err();
    assert!(matches!(err, RunnerError::Formal(FormalError::InvalidScenario(_))));
    let err = tokio_test::block_on(session.query(&scenario, &Atom::new("alive", &["a", "n1"])))
        .unwrap_err();
    assert!(err.is_bad_input());
}
