//! The front-end loop, independent of how a front-end draws or reads input.

use crate::alert::Alert;
use crate::error::AppError;
use crate::notify::Notifier;
use crate::session::{Intent, Outcome, Session, Snapshot};
use time::OffsetDateTime;
use tracing::{debug, warn};

pub trait Clock {
    fn now(&self) -> OffsetDateTime;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    Intent(Intent),
    Quit,
}

pub trait Frontend {
    /// Waits at most `tick` for the user. `Ok(None)` means nothing arrived.
    fn next_input(&mut self, tick: std::time::Duration) -> Result<Option<Input>, AppError>;

    fn on_alert(&mut self, alert: &Alert, snapshot: &Snapshot);

    fn on_outcome(&mut self, outcome: Result<Outcome, AppError>, snapshot: &Snapshot);
}

/// Runs until the front-end asks to quit. Rejected intents are handed back to
/// the front-end; only a failure to read input ends the loop with an error.
pub fn run(
    session: &mut Session,
    frontend: &mut dyn Frontend,
    notifier: &dyn Notifier,
    clock: &dyn Clock,
    tick: std::time::Duration,
) -> Result<(), AppError> {
    loop {
        let now = clock.now();
        if let Some(alert) = session.tick(now) {
            if let Err(err) = notifier.notify(&alert) {
                warn!(error = %err, "alert notification failed");
            }
            frontend.on_alert(&alert, &session.snapshot(now));
        }

        match frontend.next_input(tick)? {
            None => {}
            Some(Input::Quit) => return Ok(()),
            Some(Input::Intent(intent)) => {
                let now = clock.now();
                let outcome = session.dispatch(intent, now);
                if let Err(err) = &outcome {
                    debug!(code = err.code(), "intent rejected");
                }
                frontend.on_outcome(outcome, &session.snapshot(now));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Clock, Frontend, Input, run};
    use crate::alert::{Alert, TaskPicker};
    use crate::error::AppError;
    use crate::model::{Repetitions, TaskSpec};
    use crate::notify::Notifier;
    use crate::session::{Intent, Outcome, Session, Snapshot};
    use crate::storage::AccountStore;
    use std::cell::{Cell, RefCell};
    use std::collections::VecDeque;
    use std::path::PathBuf;
    use std::rc::Rc;
    use std::time::{SystemTime, UNIX_EPOCH};
    use time::{Duration, OffsetDateTime, macros::datetime};

    const T0: OffsetDateTime = datetime!(2025-12-20 09:00:00 UTC);

    #[derive(Clone)]
    struct ManualClock(Rc<Cell<OffsetDateTime>>);

    impl Clock for ManualClock {
        fn now(&self) -> OffsetDateTime {
            self.0.get()
        }
    }

    struct FirstPicker;

    impl TaskPicker for FirstPicker {
        fn pick(&mut self, len: usize) -> Option<usize> {
            (len > 0).then_some(0)
        }
    }

    #[derive(Default)]
    struct RecordingNotifier {
        alerts: RefCell<Vec<Alert>>,
    }

    impl Notifier for RecordingNotifier {
        fn notify(&self, alert: &Alert) -> Result<(), AppError> {
            self.alerts.borrow_mut().push(alert.clone());
            Err(AppError::io("no notification daemon"))
        }
    }

    /// Replays scripted input, letting `step` pass on the clock per poll.
    struct ScriptedFrontend {
        clock: ManualClock,
        step: Duration,
        script: VecDeque<Option<Input>>,
        alerts: Vec<Alert>,
        outcomes: Vec<Result<Outcome, AppError>>,
    }

    impl ScriptedFrontend {
        fn new(clock: ManualClock, script: Vec<Option<Input>>) -> Self {
            Self {
                clock,
                step: Duration::seconds(30),
                script: script.into(),
                alerts: Vec::new(),
                outcomes: Vec::new(),
            }
        }
    }

    impl Frontend for ScriptedFrontend {
        fn next_input(&mut self, _tick: std::time::Duration) -> Result<Option<Input>, AppError> {
            self.clock.0.set(self.clock.0.get() + self.step);
            Ok(self.script.pop_front().unwrap_or(Some(Input::Quit)))
        }

        fn on_alert(&mut self, alert: &Alert, snapshot: &Snapshot) {
            assert_eq!(snapshot.selected_task_id(), Some(alert.task_id.as_str()));
            self.alerts.push(alert.clone());
        }

        fn on_outcome(&mut self, outcome: Result<Outcome, AppError>, _snapshot: &Snapshot) {
            self.outcomes.push(outcome);
        }
    }

    struct BrokenInput;

    impl Frontend for BrokenInput {
        fn next_input(&mut self, _tick: std::time::Duration) -> Result<Option<Input>, AppError> {
            Err(AppError::io("stdin closed unexpectedly"))
        }

        fn on_alert(&mut self, _alert: &Alert, _snapshot: &Snapshot) {}

        fn on_outcome(&mut self, _outcome: Result<Outcome, AppError>, _snapshot: &Snapshot) {}
    }

    fn temp_path(file_name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!("earnit-{nanos}-{file_name}"))
    }

    fn session_with_task(file_name: &str, interval: Option<Duration>) -> (Session, String) {
        let store = AccountStore::new(temp_path(file_name));
        let mut session =
            Session::enroll(store, "Sam", "$", interval, T0, Box::new(FirstPicker)).unwrap();
        let spec = TaskSpec::constant("laundry", Repetitions::Unbounded, 2.0);
        let id = session.create_task(&spec).unwrap().id().to_string();
        (session, id)
    }

    fn complete(id: &str) -> Option<Input> {
        Some(Input::Intent(Intent::CompleteTask { id: id.to_string() }))
    }

    #[test]
    fn alerts_fire_and_clear_through_the_loop() {
        let (mut session, id) = session_with_task("driver-loop.json", Some(Duration::seconds(60)));
        let clock = ManualClock(Rc::new(Cell::new(T0)));
        let script = vec![
            None,
            None,
            None,
            complete("task-404"),
            complete(&id),
            None,
            None,
        ];
        let mut frontend = ScriptedFrontend::new(clock.clone(), script);
        let notifier = RecordingNotifier::default();

        run(
            &mut session,
            &mut frontend,
            &notifier,
            &clock,
            std::time::Duration::from_millis(1),
        )
        .unwrap();
        std::fs::remove_file(session.store().path()).ok();

        assert_eq!(frontend.alerts.len(), 2);
        assert_eq!(notifier.alerts.borrow().len(), 2);
        assert_eq!(frontend.outcomes.len(), 2);

        let missing = frontend.outcomes[0].as_ref().unwrap_err();
        assert_eq!(missing.code(), "task_not_found");
        match frontend.outcomes[1].as_ref().unwrap() {
            Outcome::Completed(completion) => {
                assert!(completion.acknowledged_alert);
                assert_eq!(completion.reward, 2.0);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(session.user().balance(), 2.0);
        assert_eq!(session.alert().last_alert(), T0 + Duration::seconds(150));
    }

    #[test]
    fn disabled_alerts_never_fire_in_the_loop() {
        let (mut session, _id) = session_with_task("driver-disabled.json", None);
        let clock = ManualClock(Rc::new(Cell::new(T0)));
        let mut frontend = ScriptedFrontend::new(clock.clone(), vec![None; 50]);
        frontend.step = Duration::hours(1);
        let notifier = RecordingNotifier::default();

        run(
            &mut session,
            &mut frontend,
            &notifier,
            &clock,
            std::time::Duration::from_millis(1),
        )
        .unwrap();
        std::fs::remove_file(session.store().path()).ok();

        assert!(frontend.alerts.is_empty());
        assert!(notifier.alerts.borrow().is_empty());
    }

    #[test]
    fn input_failure_ends_the_loop() {
        let (mut session, _id) = session_with_task("driver-broken.json", None);
        let clock = ManualClock(Rc::new(Cell::new(T0)));
        let notifier = RecordingNotifier::default();

        let err = run(
            &mut session,
            &mut BrokenInput,
            &notifier,
            &clock,
            std::time::Duration::from_millis(1),
        )
        .unwrap_err();
        std::fs::remove_file(session.store().path()).ok();

        assert_eq!(err.code(), "io_error");
    }
}
