use cpu_time::ProcessTime;
use nautica_core::{
    prepro::ProblemFile, NavFunctions, Navigate, Nautili, Nautilus, Nautilus1, NautilusNavigator,
    Preference, StepRequest, StepResponse,
};

mod cli;
use cli::{Cli, Method};

fn main() -> anyhow::Result<()> {
    let cli = Cli::init();

    match sub_main(&cli) {
        Ok(_) => (),
        Err(err) => {
            cli.error(&format!("{err:#}"))?;
        }
    };

    Ok(())
}

fn sub_main(cli: &Cli) -> anyhow::Result<()> {
    cli.print_header()?;
    cli.print_config()?;

    cli.info(&format!(
        "loading problem {}",
        cli.problem_path.display()
    ))?;
    let problem = ProblemFile::load(&cli.problem_path)?;
    let (space, front) = problem.build()?;

    let start = ProcessTime::now();
    let history = match &cli.method {
        Method::Navigator {
            preference,
            steps,
            go_back,
            second_preference,
        } => {
            let mut alg = NautilusNavigator::new(space, front.clone(), front);
            let mut history = navigate(&mut alg, cli, preference, *steps)?;
            if let Some(back) = go_back {
                let Some(remaining) = steps.checked_sub(*back).filter(|&rem| rem > 0) else {
                    cli.error("--go-back must leave at least one step to take")?;
                    anyhow::bail!(Error::InvalidConfig);
                };
                let preference = second_preference
                    .clone()
                    .unwrap_or_else(|| preference.clone());
                let mut request = StepRequest::fresh(preference.clone(), remaining);
                request.go_back_to = Some(*back);
                let response = alg.step(&history, &request)?;
                history.push(response);
                if remaining > 1 {
                    alg.all_steps(&mut history, &preference, remaining - 1)?;
                }
            }
            cli.print_stats(alg.stats())?;
            history
        }
        Method::Nautilus { preference, opts } => {
            if opts.total_steps == 0 {
                cli.error("the total number of steps must be positive")?;
                anyhow::bail!(Error::InvalidConfig);
            }
            let steps = opts.total_steps;
            let mut alg = Nautilus::new(space, front.clone(), front, *opts);
            let history = navigate(&mut alg, cli, preference, steps)?;
            cli.print_stats(alg.stats())?;
            history
        }
        Method::Nautilus1 { preference, steps } => {
            let mut alg = Nautilus1::new(space, front.clone(), front);
            let history = navigate(&mut alg, cli, preference, *steps)?;
            cli.print_stats(alg.stats())?;
            history
        }
        Method::Nautili {
            preference,
            makers,
            steps,
        } => {
            let mut alg = Nautili::new(space, front.clone(), front, makers.iter().cloned());
            let history = navigate(&mut alg, cli, preference, *steps)?;
            cli.print_stats(alg.stats())?;
            history
        }
    };

    cli.print_history(&history)?;
    if let Some(path) = &cli.history_out {
        std::fs::write(path, serde_json::to_string_pretty(&history)?)?;
        cli.info(&format!("wrote history to {}", path.display()))?;
    }
    cli.info(&format!("cpu-time: {:.3}s", start.elapsed().as_secs_f64()))?;
    Ok(())
}

fn navigate<Alg>(
    alg: &mut Alg,
    cli: &Cli,
    preference: &Preference,
    steps: usize,
) -> anyhow::Result<Vec<StepResponse>>
where
    Alg: Navigate + NavFunctions,
{
    if steps == 0 {
        cli.error("the number of steps must be positive")?;
        anyhow::bail!(Error::InvalidConfig);
    }

    alg.attach_logger(cli.new_cli_logger());

    let mut history = vec![alg.initialize()?];
    alg.all_steps(&mut history, preference, steps)?;

    Ok(history)
}

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
enum Error {
    #[error("Invalid configuration")]
    InvalidConfig,
}
