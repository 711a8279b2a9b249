use std::io::{BufRead, Write};

use anyhow::{Context, Result};
use rand::Rng;
use tracing::{debug, info};
use vscreen_core::{Eye, SessionStatus, TestResult};
use vscreen_experiment::{ResultStore, SessionUpdate, TestSession};
use vscreen_timing::Timer;

use crate::config::HostContext;
use crate::input::parse_response;
use crate::render;

const DISCLAIMER: &str = "These self-screening tests do not replace an eye examination. \
If you notice sudden changes in your vision, contact an eye care professional.";

/// Interactive line-based host driving one session.
pub struct App<I, O> {
    input: I,
    output: O,
    context: HostContext,
}

impl<I: BufRead, O: Write> App<I, O> {
    pub fn new(input: I, output: O, context: HostContext) -> Self {
        Self {
            input,
            output,
            context,
        }
    }

    /// Reads one line; `None` on end of input.
    fn read_line(&mut self) -> Result<Option<String>> {
        let mut line = String::new();
        let n = self
            .input
            .read_line(&mut line)
            .context("failed to read input")?;
        Ok((n > 0).then(|| line.trim().to_string()))
    }

    fn say(&mut self, text: &str) -> Result<()> {
        writeln!(self.output, "{text}")?;
        self.output.flush()?;
        Ok(())
    }

    /// Shows the disclaimer unless the host context already records consent.
    pub fn ensure_disclaimer(&mut self) -> Result<bool> {
        if self.context.disclaimer_accepted {
            return Ok(true);
        }
        self.say(DISCLAIMER)?;
        self.say("Type 'yes' to continue.")?;
        let accepted = matches!(self.read_line()?.as_deref(), Some("yes" | "y"));
        self.context.disclaimer_accepted = accepted;
        Ok(accepted)
    }

    fn choose_eye(&mut self, suggested: Option<Eye>) -> Result<Option<Eye>> {
        if let Some(eye) = suggested {
            return Ok(Some(eye));
        }
        loop {
            self.say("Which eye are you testing? [left/right, q to quit]")?;
            let Some(line) = self.read_line()? else {
                return Ok(None);
            };
            if line == "q" {
                return Ok(None);
            }
            match line.parse::<Eye>() {
                Ok(eye) => return Ok(Some(eye)),
                Err(e) => self.say(&e)?,
            }
        }
    }

    /// Drives `session` until it is exited or every requested eye is done,
    /// saving each finalized result to `store`.
    pub fn run<T, R, S>(
        &mut self,
        session: &mut TestSession<T, R>,
        first_eye: Option<Eye>,
        store: &mut S,
    ) -> Result<Vec<TestResult>>
    where
        T: Timer<Timestamp = u64>,
        R: Rng,
        S: ResultStore + ?Sized,
    {
        let test_type = session.test_type();
        let mut results = Vec::new();
        let mut pending_eye = first_eye;

        loop {
            match session.status() {
                SessionStatus::EyeSelection => match self.choose_eye(pending_eye.take())? {
                    Some(eye) => session.select_eye(eye)?,
                    None => session.close(),
                },
                SessionStatus::Instructions => {
                    self.say(&format!("== {} ==", test_type.title()))?;
                    self.say(render::instructions(test_type))?;
                    self.say("Press Enter to start, q to quit.")?;
                    match self.read_line()?.as_deref() {
                        None | Some("q") => session.close(),
                        Some(_) => session.start()?,
                    }
                }
                SessionStatus::Running => {
                    let (level, levels) = session.level_progress();
                    let prompt = render::stimulus(session.present_trial()?, level, levels);
                    self.say(&prompt)?;
                    let Some(line) = self.read_line()? else {
                        session.close();
                        continue;
                    };
                    if line == "q" {
                        session.exit()?;
                        self.say("Test exited; nothing was saved.")?;
                        continue;
                    }
                    let lapsed = session
                        .update()
                        .iter()
                        .any(|u| matches!(u, SessionUpdate::TimedOut(_)));
                    if lapsed {
                        self.say(render::TOO_SLOW)?;
                        continue;
                    }
                    let Some(stimulus) = session.current_stimulus() else {
                        continue;
                    };
                    let response = match parse_response(stimulus, &line) {
                        Ok(response) => response,
                        Err(hint) => {
                            self.say(&hint)?;
                            continue;
                        }
                    };
                    match session.record_response(response) {
                        Ok(outcome) => {
                            if let Some(feedback) = outcome.feedback {
                                self.say(render::feedback(feedback))?;
                            }
                        }
                        Err(e) if e.is_silent() => debug!(error = %e, "input dropped"),
                        Err(e) => return Err(e.into()),
                    }
                }
                SessionStatus::Feedback => {
                    if let Some(remaining) = session.feedback_remaining() {
                        session.timer().sleep(remaining);
                    }
                    session.update();
                }
                SessionStatus::Complete => {
                    let result = session.finalize_into(store)?;
                    info!(test = %test_type, status = ?result.status, "result saved");
                    self.say(&render::result(&result))?;
                    results.push(result);

                    if !test_type.is_two_eye() {
                        break;
                    }
                    match session.next_eye()? {
                        Some(other) => {
                            self.say(&format!("Test your {other} eye now? [y/n]"))?;
                            if matches!(self.read_line()?.as_deref(), Some("y" | "yes")) {
                                pending_eye = Some(other);
                            } else {
                                break;
                            }
                        }
                        None => break,
                    }
                }
                SessionStatus::Exited => break,
            }
        }

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{self, Read};
    use std::time::Duration;

    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use vscreen_core::{ResultStatus, Summary, TestType};
    use vscreen_experiment::{EngineConfig, MemoryStore};
    use vscreen_timing::ManualTimer;

    fn run_script(
        test_type: TestType,
        eye: Option<Eye>,
        script: &str,
    ) -> (Vec<TestResult>, MemoryStore, String) {
        let mut session = TestSession::new(
            test_type,
            EngineConfig::default(),
            ManualTimer::new(),
            StdRng::seed_from_u64(1),
        );
        let mut store = MemoryStore::new();
        let mut output = Vec::new();
        let context = HostContext {
            disclaimer_accepted: true,
            results_path: None,
        };
        let results = App::new(script.as_bytes(), &mut output, context)
            .run(&mut session, eye, &mut store)
            .unwrap();
        (results, store, String::from_utf8(output).unwrap())
    }

    #[test]
    fn color_vision_script_saves_one_result() {
        let script = "\n12\n8\n29\n5\n3\n15\n74\n6\n";
        let (results, store, output) = run_script(TestType::ColorVision, None, script);
        assert_eq!(results.len(), 1);
        assert_eq!(store.len(), 1);
        assert_eq!(results[0].status, ResultStatus::Normal);
        assert!(output.contains("8/8 plates"));
    }

    #[test]
    fn unparseable_answers_are_reprompted() {
        let script = "\n\nabc\nn\nn\nn\nn\n";
        let (results, _, output) = run_script(TestType::AmslerGrid, None, script);
        assert_eq!(results.len(), 1);
        assert!(output.contains("answer y or n"));
    }

    #[test]
    fn quitting_mid_test_saves_nothing() {
        let script = "\nn\nq\nq\n";
        let (results, store, output) = run_script(TestType::AmslerGrid, None, script);
        assert!(results.is_empty());
        assert!(store.is_empty());
        assert!(output.contains("nothing was saved"));
    }

    #[test]
    fn two_eye_test_offers_the_other_eye() {
        let script = "\nequal\ny\n\n3\n";
        let (results, store, output) =
            run_script(TestType::Astigmatism, Some(Eye::Left), script);
        assert_eq!(results.len(), 2);
        assert_eq!(store.len(), 2);
        assert_eq!(results[0].eye, Some(Eye::Left));
        assert_eq!(results[1].eye, Some(Eye::Right));
        assert_eq!(results[1].status, ResultStatus::Concerns);
        assert!(output.contains("Test your right eye now?"));
    }

    /// Scripted input where every line takes `delay` of session time to type.
    struct SlowInput<'a> {
        lines: &'a [u8],
        timer: ManualTimer,
        delay: Duration,
    }

    impl Read for SlowInput<'_> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.lines.read(buf)
        }
    }

    impl BufRead for SlowInput<'_> {
        fn fill_buf(&mut self) -> io::Result<&[u8]> {
            self.lines.fill_buf()
        }

        fn consume(&mut self, amt: usize) {
            self.lines.consume(amt)
        }

        fn read_line(&mut self, buf: &mut String) -> io::Result<usize> {
            self.timer.advance(self.delay);
            self.lines.read_line(buf)
        }
    }

    #[test]
    fn late_peripheral_answers_count_as_misses() {
        let timer = ManualTimer::new();
        let mut session = TestSession::new(
            TestType::PeripheralVision,
            EngineConfig::default(),
            timer.clone(),
            StdRng::seed_from_u64(1),
        );
        let script = format!("\n{}", "n\n".repeat(13));
        let input = SlowInput {
            lines: script.as_bytes(),
            timer,
            delay: Duration::from_secs(10),
        };
        let mut store = MemoryStore::new();
        let mut output = Vec::new();
        let context = HostContext {
            disclaimer_accepted: true,
            results_path: None,
        };
        let results = App::new(input, &mut output, context)
            .run(&mut session, Some(Eye::Left), &mut store)
            .unwrap();

        assert_eq!(results.len(), 1);
        let Summary::PeripheralVision { hits, total, .. } = &results[0].summary else {
            panic!("wrong summary");
        };
        assert_eq!((*hits, *total), (0, 12));
        assert_eq!(results[0].status, ResultStatus::Concerns);
        let output = String::from_utf8(output).unwrap();
        assert_eq!(output.matches(render::TOO_SLOW).count(), 12);
    }

    #[test]
    fn disclaimer_requires_explicit_yes() {
        let mut output = Vec::new();
        let mut app = App::new("no\n".as_bytes(), &mut output, HostContext::default());
        assert!(!app.ensure_disclaimer().unwrap());
    }
}
