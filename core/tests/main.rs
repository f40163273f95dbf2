use nautica_core::{
    history, prepro::ProblemFile, Error, GroupPreference, NavFunctions, Navigate, Nautili,
    Nautilus, Nautilus1, NautilusNavigator, NautilusOptions, ObjectivePoint, Preference,
    StepRequest, StepResponse,
};

macro_rules! river {
    () => {{
        ProblemFile::load("./data/river.json").unwrap().build().unwrap()
    }};
}

macro_rules! check_monotone {
    ($space:expr, $history:expr) => {{
        for pair in $history.windows(2) {
            let prev = $space.correct(&pair[0].navigation_point).unwrap();
            let next = $space.correct(&pair[1].navigation_point).unwrap();
            for (symbol, &val) in &next {
                assert!(
                    val <= prev[symbol] + 1e-9,
                    "objective {symbol} worsened from {} to {val}",
                    prev[symbol]
                );
            }
            assert!(pair[1].distance_to_front >= pair[0].distance_to_front - 1e-9);
        }
    }};
}

macro_rules! check_bounds_shrink {
    ($history:expr) => {{
        for pair in $history.windows(2) {
            let (prev, next) = (&pair[0].reachable_bounds, &pair[1].reachable_bounds);
            for (symbol, &lower) in &next.lower_bounds {
                assert!(lower >= prev.lower_bounds[symbol] - 1e-9);
                assert!(next.upper_bounds[symbol] <= prev.upper_bounds[symbol] + 1e-9);
            }
        }
    }};
}

fn point(entries: &[(&str, f64)]) -> ObjectivePoint {
    entries
        .iter()
        .map(|&(symbol, value)| (String::from(symbol), value))
        .collect()
}

fn reference(entries: &[(&str, f64)]) -> Preference {
    Preference::ReferencePoint {
        point: point(entries),
    }
}

fn group(points: &[(&str, &[(&str, f64)])]) -> Preference {
    Preference::Group(GroupPreference {
        reference_points: points
            .iter()
            .map(|&(dm, entries)| (String::from(dm), point(entries)))
            .collect(),
        ..Default::default()
    })
}

#[test]
fn navigator_walks_to_the_front() {
    let (space, front) = river!();
    let mut alg = NautilusNavigator::new(space.clone(), front.clone(), front);
    let mut hist = vec![alg.initialize().unwrap()];
    assert_eq!(hist[0].navigation_point, space.nadir_point());
    assert_eq!(hist[0].distance_to_front, 0.);
    assert_eq!(
        hist[0].reachable_bounds.lower_bounds,
        point(&[("cost", 100.), ("quality", 2.)])
    );
    assert_eq!(
        hist[0].reachable_bounds.upper_bounds,
        point(&[("cost", 900.), ("quality", 12.)])
    );

    alg.all_steps(&mut hist, &reference(&[("cost", 300.), ("quality", 10.)]), 5)
        .unwrap();
    assert_eq!(hist.len(), 6);
    check_monotone!(space, hist);
    check_bounds_shrink!(hist);

    let last = hist.last().unwrap();
    assert_eq!(last.step_number, 5);
    assert_eq!(last.navigation_point, point(&[("cost", 400.), ("quality", 7.)]));
    assert!((last.distance_to_front - 100.).abs() < 1e-6);
}

#[test]
fn batch_reuses_the_first_projection() {
    let (space, front) = river!();
    let mut alg = NautilusNavigator::new(space, front.clone(), front);
    let mut hist = vec![alg.initialize().unwrap()];
    let pref = reference(&[("cost", 300.), ("quality", 10.)]);
    alg.all_steps(&mut hist, &pref, 5).unwrap();

    let stats = alg.stats();
    assert_eq!(stats.n_steps, 5);
    assert_eq!(stats.n_projections, 1);
    assert_eq!(stats.n_bounds_computations, 6);
    assert_eq!(stats.n_subproblem_calls, 13);

    // every step records the preference that drove it, only the
    // initialization carries none
    assert_eq!(hist[0].preference, None);
    for resp in &hist[1..] {
        assert_eq!(resp.preference.as_ref(), Some(&pref));
        assert_eq!(
            resp.reachable_solution,
            Some(point(&[("cost", 400.), ("quality", 7.)]))
        );
    }
}

#[test]
fn stepping_back_opens_a_branch() {
    let (space, front) = river!();
    let mut alg = NautilusNavigator::new(space, front.clone(), front);
    let mut hist = vec![alg.initialize().unwrap()];
    let pref = reference(&[("cost", 300.), ("quality", 10.)]);
    for remaining in (1..=3).rev() {
        let resp = alg
            .step(&hist, &StepRequest::fresh(pref.clone(), remaining))
            .unwrap();
        hist.push(resp);
    }
    assert_eq!(hist.last().unwrap().step_number, 3);

    // reconsider from step 1 with a different target
    let mut request = StepRequest::fresh(reference(&[("cost", 200.), ("quality", 6.)]), 2);
    request.go_back_to = Some(1);
    let resp = alg.step(&hist, &request).unwrap();
    assert_eq!(resp.step_number, 2);
    assert_eq!(
        resp.reachable_solution,
        Some(point(&[("cost", 250.), ("quality", 5.)]))
    );
    hist.push(resp);

    assert_eq!(history::step_back_index(&hist, 1).unwrap(), 1);
    assert_eq!(history::current_path(&hist).unwrap(), vec![0, 1, 4]);

    // continuing steps from the branch end
    let resp = alg
        .step(&hist, &StepRequest::fresh(reference(&[("cost", 200.), ("quality", 6.)]), 1))
        .unwrap();
    assert_eq!(resp.step_number, 3);
    hist.push(resp);
    assert_eq!(history::current_path(&hist).unwrap(), vec![0, 1, 4, 5]);
}

#[test]
fn nautilus_budget_is_enforced() {
    let (space, front) = river!();
    let mut alg = Nautilus::new(
        space.clone(),
        front.clone(),
        front,
        NautilusOptions { total_steps: 3 },
    );
    let mut hist = vec![alg.initialize().unwrap()];
    let res = alg.all_steps(&mut hist, &reference(&[("cost", 300.), ("quality", 10.)]), 5);
    assert_eq!(res, Err(Error::InvalidStepCount(0)));

    // the three budgeted steps survive the failed fourth
    assert_eq!(hist.len(), 4);
    assert_eq!(hist.last().unwrap().step_number, 3);
    assert!((hist.last().unwrap().distance_to_front - 100.).abs() < 1e-6);
    check_monotone!(space, hist);
}

#[test]
fn nautilus1_ranks() {
    let (space, front) = river!();
    let mut alg = Nautilus1::new(space.clone(), front.clone(), front);
    let mut hist = vec![alg.initialize().unwrap()];
    let pref = Preference::Ranks {
        ranks: [(String::from("cost"), 2), (String::from("quality"), 1)]
            .into_iter()
            .collect(),
    };
    alg.all_steps(&mut hist, &pref, 3).unwrap();
    check_monotone!(space, hist);
    // quality is most important and dominates the weighting
    assert_eq!(
        hist.last().unwrap().reachable_solution,
        Some(point(&[("cost", 900.), ("quality", 12.)]))
    );
}

#[test]
fn nautilus1_percentages() {
    let (space, front) = river!();
    let mut alg = Nautilus1::new(space, front.clone(), front);
    let mut hist = vec![alg.initialize().unwrap()];
    let pref = Preference::Percentages {
        percentages: [(String::from("cost"), 80.), (String::from("quality"), 20.)]
            .into_iter()
            .collect(),
    };
    alg.all_steps(&mut hist, &pref, 3).unwrap();
    assert_eq!(
        hist.last().unwrap().reachable_solution,
        Some(point(&[("cost", 100.), ("quality", 2.)]))
    );
}

#[test]
fn nautili_group_walk() {
    let (space, front) = river!();
    let mut alg = Nautili::new(space.clone(), front.clone(), front, ["anna", "ben"]);
    let mut hist = vec![alg.initialize().unwrap()];
    let pref = group(&[
        ("anna", &[("cost", 300.), ("quality", 10.)]),
        ("ben", &[("cost", 500.), ("quality", 8.)]),
    ]);
    let resp = alg.step(&hist, &StepRequest::fresh(pref, 4)).unwrap();
    let Some(Preference::Group(recorded)) = &resp.preference else {
        panic!("group step must record a group preference");
    };
    assert_eq!(
        recorded.improvement_directions["anna"],
        point(&[("cost", 600.), ("quality", 8.)])
    );
    assert_eq!(
        recorded.improvement_directions["ben"],
        point(&[("cost", 400.), ("quality", 6.)])
    );
    assert_eq!(
        recorded.group_direction,
        point(&[("cost", 500.), ("quality", 7.)])
    );
    assert_eq!(
        resp.reachable_solution,
        Some(point(&[("cost", 400.), ("quality", 7.)]))
    );
    hist.push(resp);

    // ben stays silent, his direction is carried forward
    let pref = group(&[("anna", &[("cost", 250.), ("quality", 9.)])]);
    let resp = alg.step(&hist, &StepRequest::fresh(pref, 3)).unwrap();
    let Some(Preference::Group(recorded)) = &resp.preference else {
        panic!("group step must record a group preference");
    };
    assert_eq!(
        recorded.improvement_directions["ben"],
        point(&[("cost", 400.), ("quality", 6.)])
    );
    hist.push(resp);
    check_monotone!(space, hist);
}

#[test]
fn nautili_step_back_discards_abandoned_directions() {
    let (space, front) = river!();
    let mut alg = Nautili::new(space, front.clone(), front, ["anna", "ben"]);
    let mut hist = vec![alg.initialize().unwrap()];
    let pref = group(&[
        ("anna", &[("cost", 300.), ("quality", 10.)]),
        ("ben", &[("cost", 500.), ("quality", 8.)]),
    ]);
    hist.push(alg.step(&hist, &StepRequest::fresh(pref, 4)).unwrap());

    // ben changes his mind on step 2, anna stays silent
    let pref = group(&[("ben", &[("cost", 100.), ("quality", 12.)])]);
    let resp = alg.step(&hist, &StepRequest::fresh(pref, 3)).unwrap();
    let Some(Preference::Group(recorded)) = &resp.preference else {
        panic!("group step must record a group preference");
    };
    assert_eq!(
        recorded.improvement_directions["ben"],
        point(&[("cost", 675.), ("quality", 8.75)])
    );
    hist.push(resp);

    // the group reconsiders from step 1, reusing the known solution
    let mut request = StepRequest::reuse(point(&[("cost", 400.), ("quality", 7.)]), 3);
    request.go_back_to = Some(1);
    hist.push(alg.step(&hist, &request).unwrap());

    // silent ben now gets the direction he stated on the live path, not
    // the abandoned second step's
    let pref = group(&[("anna", &[("cost", 250.), ("quality", 9.)])]);
    let resp = alg.step(&hist, &StepRequest::fresh(pref, 2)).unwrap();
    let Some(Preference::Group(recorded)) = &resp.preference else {
        panic!("group step must record a group preference");
    };
    assert_eq!(
        recorded.improvement_directions["ben"],
        point(&[("cost", 400.), ("quality", 6.)])
    );
}

#[test]
fn nautili_rejects_inferior_points() {
    let (space, front) = river!();
    let mut alg = Nautili::new(space, front.clone(), front, ["anna", "ben"]);
    let hist = vec![alg.initialize().unwrap()];
    // anna's point matches the navigation point in cost, which counts as
    // not improving
    let pref = group(&[
        ("anna", &[("cost", 900.), ("quality", 5.)]),
        ("ben", &[("cost", 500.), ("quality", 8.)]),
    ]);
    assert_eq!(
        alg.step(&hist, &StepRequest::fresh(pref, 4)),
        Err(Error::InferiorReferencePoint {
            dm: String::from("anna"),
            objectives: vec![String::from("cost")],
        })
    );
}

#[test]
fn nautili_requires_initial_preferences() {
    let (space, front) = river!();
    let mut alg = Nautili::new(space, front.clone(), front, ["anna", "ben"]);
    let hist = vec![alg.initialize().unwrap()];
    let pref = group(&[("anna", &[("cost", 300.), ("quality", 10.)])]);
    assert_eq!(
        alg.step(&hist, &StepRequest::fresh(pref, 4)),
        Err(Error::MissingInitialPreference {
            dm: String::from("ben")
        })
    );
}

#[test]
fn ambiguous_input_is_rejected() {
    let (space, front) = river!();
    let mut alg = NautilusNavigator::new(space, front.clone(), front);
    let hist = vec![alg.initialize().unwrap()];

    let mut request = StepRequest::fresh(reference(&[("cost", 300.), ("quality", 10.)]), 3);
    request.reuse_solution = Some(point(&[("cost", 400.), ("quality", 7.)]));
    assert_eq!(
        alg.step(&hist, &request),
        Err(Error::AmbiguousStepInput)
    );
    assert_eq!(
        alg.step(&hist, &StepRequest::default()),
        Err(Error::AmbiguousStepInput)
    );
}

#[test]
fn history_serialization_round_trip() {
    let (space, front) = river!();
    let mut alg = NautilusNavigator::new(space, front.clone(), front);
    let mut hist = vec![alg.initialize().unwrap()];
    let pref = reference(&[("cost", 300.), ("quality", 10.)]);
    for remaining in (1..=2).rev() {
        let resp = alg
            .step(&hist, &StepRequest::fresh(pref.clone(), remaining))
            .unwrap();
        hist.push(resp);
    }
    let mut request = StepRequest::fresh(reference(&[("cost", 200.), ("quality", 6.)]), 1);
    request.go_back_to = Some(1);
    hist.push(alg.step(&hist, &request).unwrap());

    let json = serde_json::to_string(&hist).unwrap();
    let restored: Vec<StepResponse> = serde_json::from_str(&json).unwrap();
    assert_eq!(restored, hist);
    assert_eq!(
        history::current_path(&restored).unwrap(),
        history::current_path(&hist).unwrap()
    );
    assert_eq!(history::step_back_index(&restored, 1).unwrap(), 1);
}
