use crate::animate::lerp;
use crate::backend::{OpenMode, OsBackend, Pace, Registry, Selector, TimeBackend, VideoBackend};
use crate::color::{Channel, Rgb};
use crate::error::{Error, Result};
use crate::gamma::GammaRamp;
use crate::kelvin::rgb_from_kelvin;

/// Name of the persisted pre-adjustment ramp.
pub const DEFAULT_GAMMA: &str = "gamma";

#[derive(Clone, Debug)]
pub struct Request {
    pub kelvin: u32,
    /// Replaces the Kelvin-derived color before channel overrides apply.
    pub color: Option<Rgb>,
    pub channels: [Channel; 3],
    pub identity: bool,
    pub reset: bool,
    pub save: bool,
    pub animate_ms: u64,
    pub delay_ms: u64,
    pub os: Selector,
    pub video: Selector,
    pub gamma: Selector,
    pub time: Selector,
}

impl Default for Request {
    fn default() -> Self {
        Self {
            kelvin: 3400,
            color: None,
            channels: [Channel::Auto; 3],
            identity: false,
            reset: false,
            save: false,
            animate_ms: 0,
            delay_ms: 0,
            os: Selector::Auto,
            video: Selector::Auto,
            gamma: Selector::Auto,
            time: Selector::Auto,
        }
    }
}

/// Explicit selection wins; otherwise the hint from an earlier backend, if known.
fn hinted(
    selector: Selector,
    hint: Option<&str>,
    position: impl Fn(&str) -> Option<usize>,
) -> Selector {
    match (selector, hint.and_then(position)) {
        (Selector::Auto, Some(index)) => Selector::Index(index),
        _ => selector,
    }
}

/// Brings up the backends, computes the target ramp and applies it.
///
/// Backends live in locals declared in initialisation order, so whichever were
/// acquired are released in reverse order on every return path.
pub fn run(req: &Request, registry: &Registry) -> Result<()> {
    let os = registry.os.init(req.os)?;
    let mut video = registry.video.init(req.video)?;
    let gamma_selector = hinted(req.gamma, video.gamma_hint(), |n| registry.gamma.position(n));
    let mut gamma = registry.gamma.init(gamma_selector)?;
    let time_selector = hinted(req.time, os.time_hint(), |n| registry.time.position(n));
    let mut clock = registry.time.init(time_selector)?;

    let depth = video.gamma_ramp_size();
    log::debug!("gamma ramp size {depth}");

    let mut current = GammaRamp::new(depth);
    video.get_gamma(&mut current)?;

    // A reset must restore an earlier save, never the possibly adjusted live ramp.
    if req.save || (!req.reset && !os.exists(DEFAULT_GAMMA)) {
        save_default(&*os, &current)?;
        if req.save {
            return Ok(());
        }
    }

    let default_gamma = if gamma.needs_default_gamma() || req.reset {
        let ramp = load_default(&*os, depth)?;
        gamma.set_default_gamma(&ramp);
        Some(ramp)
    } else {
        None
    };

    let mut target = GammaRamp::new(depth);
    match &default_gamma {
        Some(saved) if req.reset => target.copy_from(saved),
        _ if req.identity => gamma.identity(&mut target),
        _ => {
            let base = req.color.unwrap_or_else(|| rgb_from_kelvin(req.kelvin));
            let color = base.with_overrides(req.channels);
            log::info!("target color {color}");
            gamma.rgb(color, &mut target);
        }
    }

    if req.animate_ms > 0 {
        animate(
            &current,
            &target,
            &mut *video,
            &mut *clock,
            req.animate_ms,
            req.delay_ms,
        )?;
    }

    video.set_gamma(&target)?;
    Ok(())
}

fn save_default(os: &dyn OsBackend, ramp: &GammaRamp) -> Result<()> {
    let file = os.open(DEFAULT_GAMMA, OpenMode::Write)?;
    ramp.save(file)?;
    log::info!("saved current gamma to {}", os.path(DEFAULT_GAMMA).display());
    Ok(())
}

fn load_default(os: &dyn OsBackend, depth: usize) -> Result<GammaRamp> {
    if !os.exists(DEFAULT_GAMMA) {
        return Err(Error::PersistedGammaMissing(os.path(DEFAULT_GAMMA)));
    }
    let mut ramp = GammaRamp::new(depth);
    ramp.load(os.open(DEFAULT_GAMMA, OpenMode::Read)?)?;
    Ok(ramp)
}

/// Pushes interpolated frames from `start` towards `target` until `duration_ms`
/// has elapsed on the backend clock or the clock reports an interrupt.
fn animate(
    start: &GammaRamp,
    target: &GammaRamp,
    video: &mut dyn VideoBackend,
    clock: &mut dyn TimeBackend,
    duration_ms: u64,
    delay_ms: u64,
) -> Result<()> {
    let mut frame = GammaRamp::new(start.depth());
    let origin = clock.get_time();
    let mut frames = 0u64;
    loop {
        let elapsed = clock.get_time().saturating_sub(origin);
        if elapsed >= duration_ms {
            break;
        }
        lerp(start, target, &mut frame, elapsed, duration_ms);
        video.set_gamma(&frame)?;
        frames += 1;
        if clock.sleep(delay_ms) == Pace::Interrupted {
            log::info!("interrupted, jumping to target");
            break;
        }
    }
    log::debug!("animated {frames} frames over {duration_ms}ms");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::GammaBackend;
    use crate::backend::gamma::{Absolute, Relative};
    use crate::backend::time::TOKIO;
    use crate::backend::os::UnixOs;
    use crate::backend::{Capability, Variants};
    use crate::gamma;
    use anyhow::anyhow;
    use std::cell::{Cell, RefCell};
    use std::path::PathBuf;
    use std::rc::Rc;

    type Log = Rc<RefCell<Vec<String>>>;

    struct TrackedOs {
        inner: UnixOs,
        time_hint: Option<&'static str>,
        log: Log,
    }

    impl OsBackend for TrackedOs {
        fn time_hint(&self) -> Option<&'static str> {
            self.time_hint
        }

        fn path(&self, name: &str) -> PathBuf {
            self.inner.path(name)
        }

        fn open(&self, name: &str, mode: OpenMode) -> anyhow::Result<std::fs::File> {
            self.inner.open(name, mode)
        }
    }

    impl Drop for TrackedOs {
        fn drop(&mut self) {
            self.log.borrow_mut().push("uninit os".into());
        }
    }

    struct FakeVideo {
        live: GammaRamp,
        applied: Rc<RefCell<Vec<GammaRamp>>>,
        log: Log,
    }

    impl VideoBackend for FakeVideo {
        fn gamma_ramp_size(&self) -> usize {
            self.live.depth()
        }

        fn get_gamma(&mut self, ramp: &mut GammaRamp) -> anyhow::Result<()> {
            ramp.copy_from(&self.live);
            Ok(())
        }

        fn set_gamma(&mut self, ramp: &GammaRamp) -> anyhow::Result<()> {
            self.live.copy_from(ramp);
            self.applied.borrow_mut().push(ramp.clone());
            Ok(())
        }
    }

    impl Drop for FakeVideo {
        fn drop(&mut self) {
            self.log.borrow_mut().push("uninit video".into());
        }
    }

    struct TrackedGamma<G> {
        inner: G,
        log: Log,
    }

    impl<G: GammaBackend> GammaBackend for TrackedGamma<G> {
        fn needs_default_gamma(&self) -> bool {
            self.inner.needs_default_gamma()
        }

        fn set_default_gamma(&mut self, ramp: &GammaRamp) {
            self.inner.set_default_gamma(ramp)
        }

        fn rgb(&self, color: Rgb, out: &mut GammaRamp) {
            self.inner.rgb(color, out)
        }

        fn identity(&self, out: &mut GammaRamp) {
            self.inner.identity(out)
        }
    }

    impl<G> Drop for TrackedGamma<G> {
        fn drop(&mut self) {
            self.log.borrow_mut().push("uninit gamma".into());
        }
    }

    /// Time only moves when slept, `interrupt_after` sleeps report an interrupt.
    struct FakeClock {
        now: Cell<u64>,
        sleeps: usize,
        interrupt_after: Option<usize>,
        log: Log,
    }

    impl TimeBackend for FakeClock {
        fn get_time(&self) -> u64 {
            self.now.get()
        }

        fn sleep(&mut self, ms: u64) -> Pace {
            self.now.set(self.now.get() + ms);
            self.sleeps += 1;
            match self.interrupt_after {
                Some(n) if self.sleeps >= n => Pace::Interrupted,
                _ => Pace::Continue,
            }
        }
    }

    impl Drop for FakeClock {
        fn drop(&mut self) {
            self.log.borrow_mut().push("uninit time".into());
        }
    }

    struct Harness {
        dir: tempfile::TempDir,
        live: GammaRamp,
        applied: Rc<RefCell<Vec<GammaRamp>>>,
        log: Log,
        broken: Option<Capability>,
        interrupt_after: Option<usize>,
        os_time_hint: Option<&'static str>,
    }

    impl Harness {
        fn new(depth: usize) -> Self {
            let mut live = GammaRamp::new(depth);
            gamma::identity(&mut live);
            Self {
                dir: tempfile::tempdir().unwrap(),
                live,
                applied: Rc::default(),
                log: Rc::default(),
                broken: None,
                interrupt_after: None,
                os_time_hint: None,
            }
        }

        fn saved(&self) -> Option<GammaRamp> {
            let bytes = std::fs::read(self.dir.path().join(DEFAULT_GAMMA)).ok()?;
            let mut ramp = GammaRamp::new(self.live.depth());
            ramp.load(bytes.as_slice()).ok()?;
            Some(ramp)
        }

        fn save(&self, ramp: &GammaRamp) {
            let file = std::fs::File::create(self.dir.path().join(DEFAULT_GAMMA)).unwrap();
            ramp.save(file).unwrap();
        }

        fn applied(&self) -> Vec<GammaRamp> {
            self.applied.borrow().clone()
        }

        fn log(&self) -> Vec<String> {
            self.log.borrow().clone()
        }

        fn fails(&self, cap: Capability) -> anyhow::Result<()> {
            match self.broken {
                Some(broken) if broken == cap => Err(anyhow!("{cap} unavailable")),
                _ => Ok(()),
            }
        }
    }

    fn registry(harness: &Rc<Harness>) -> Registry {
        let h = Rc::clone(harness);
        let os = Variants::new(Capability::Os).with("tracked", move || {
            h.fails(Capability::Os)?;
            h.log.borrow_mut().push("init os".into());
            Ok(Box::new(TrackedOs {
                inner: UnixOs::new(h.dir.path().to_path_buf())?,
                time_hint: h.os_time_hint,
                log: Rc::clone(&h.log),
            }) as Box<dyn OsBackend>)
        });

        let h = Rc::clone(harness);
        let video = Variants::new(Capability::Video).with("fake", move || {
            h.fails(Capability::Video)?;
            h.log.borrow_mut().push("init video".into());
            Ok(Box::new(FakeVideo {
                live: h.live.clone(),
                applied: Rc::clone(&h.applied),
                log: Rc::clone(&h.log),
            }) as Box<dyn VideoBackend>)
        });

        let h = Rc::clone(harness);
        let h2 = Rc::clone(harness);
        let gamma = Variants::new(Capability::Gamma)
            .with("absolute", move || {
                h.fails(Capability::Gamma)?;
                h.log.borrow_mut().push("init gamma".into());
                Ok(Box::new(TrackedGamma {
                    inner: Absolute,
                    log: Rc::clone(&h.log),
                }) as Box<dyn GammaBackend>)
            })
            .with_manual("relative", move || {
                h2.log.borrow_mut().push("init gamma".into());
                Ok(Box::new(TrackedGamma {
                    inner: Relative::default(),
                    log: Rc::clone(&h2.log),
                }) as Box<dyn GammaBackend>)
            });

        let h = Rc::clone(harness);
        let h2 = Rc::clone(harness);
        let time = Variants::new(Capability::Time)
            .with("fake", move || {
                h.fails(Capability::Time)?;
                h.log.borrow_mut().push("init time".into());
                Ok(Box::new(FakeClock {
                    now: Cell::new(1_000),
                    sleeps: 0,
                    interrupt_after: h.interrupt_after,
                    log: Rc::clone(&h.log),
                }) as Box<dyn TimeBackend>)
            })
            .with_manual(TOKIO, move || {
                h2.log.borrow_mut().push("init hinted time".into());
                Ok(Box::new(FakeClock {
                    now: Cell::new(1_000),
                    sleeps: 0,
                    interrupt_after: None,
                    log: Rc::clone(&h2.log),
                }) as Box<dyn TimeBackend>)
            });

        Registry {
            os,
            video,
            gamma,
            time,
        }
    }

    fn run_with(harness: &Rc<Harness>, req: &Request) -> Result<()> {
        run(req, &registry(harness))
    }

    fn absolute_ramp(depth: usize, color: Rgb) -> GammaRamp {
        let mut ramp = GammaRamp::new(depth);
        gamma::absolute(color, &mut ramp);
        ramp
    }

    const TEARDOWN: [&str; 4] = ["uninit time", "uninit gamma", "uninit video", "uninit os"];

    #[test]
    fn kelvin_with_auto_channels_applies_absolute_ramp() {
        let h = Rc::new(Harness::new(256));
        let req = Request {
            kelvin: 6500,
            ..Request::default()
        };
        run_with(&h, &req).unwrap();

        let expected = absolute_ramp(256, rgb_from_kelvin(6500));
        assert_eq!(h.applied(), vec![expected]);
    }

    #[test]
    fn channel_overrides_replace_kelvin_channels() {
        let h = Rc::new(Harness::new(256));
        let req = Request {
            kelvin: 3400,
            channels: [Channel::Auto, Channel::Level(100), Channel::Level(999)],
            ..Request::default()
        };
        run_with(&h, &req).unwrap();

        let expected = absolute_ramp(256, Rgb::new(255, 100, 255));
        assert_eq!(h.applied(), vec![expected]);
    }

    #[test]
    fn explicit_color_replaces_kelvin() {
        let h = Rc::new(Harness::new(256));
        let req = Request {
            kelvin: 1000,
            color: Some(Rgb::new(255, 200, 100)),
            channels: [Channel::Auto, Channel::Auto, Channel::Level(0)],
            ..Request::default()
        };
        run_with(&h, &req).unwrap();

        let expected = absolute_ramp(256, Rgb::new(255, 200, 0));
        assert_eq!(h.applied(), vec![expected]);
    }

    #[test]
    fn identity_on_2048_entries_is_shift_by_five() {
        let h = Rc::new(Harness::new(2048));
        let req = Request {
            identity: true,
            ..Request::default()
        };
        run_with(&h, &req).unwrap();

        let applied = h.applied();
        assert_eq!(applied.len(), 1);
        for channel in applied[0].channels() {
            for (i, &sample) in channel.iter().enumerate() {
                assert_eq!(sample, (i as u16) << 5);
            }
        }
    }

    #[test]
    fn first_run_saves_live_ramp() {
        let mut harness = Harness::new(256);
        harness.live = absolute_ramp(256, Rgb::new(250, 240, 230));
        let h = Rc::new(harness);
        run_with(&h, &Request::default()).unwrap();
        assert_eq!(h.saved(), Some(h.live.clone()));
    }

    #[test]
    fn existing_save_is_kept() {
        let h = Rc::new(Harness::new(256));
        let earlier = absolute_ramp(256, Rgb::new(200, 200, 200));
        h.save(&earlier);
        run_with(&h, &Request::default()).unwrap();
        assert_eq!(h.saved(), Some(earlier));
    }

    #[test]
    fn save_request_only_saves() {
        let mut harness = Harness::new(256);
        harness.live = absolute_ramp(256, Rgb::new(255, 128, 64));
        let h = Rc::new(harness);
        h.save(&absolute_ramp(256, Rgb::new(255, 255, 255)));

        let req = Request {
            save: true,
            ..Request::default()
        };
        run_with(&h, &req).unwrap();

        assert_eq!(h.saved(), Some(h.live.clone()));
        assert!(h.applied().is_empty());
        assert_eq!(&h.log()[4..], TEARDOWN);
    }

    #[test]
    fn reset_restores_saved_gamma() {
        let h = Rc::new(Harness::new(256));
        let earlier = absolute_ramp(256, Rgb::new(10, 20, 30));
        h.save(&earlier);

        let req = Request {
            reset: true,
            ..Request::default()
        };
        run_with(&h, &req).unwrap();
        assert_eq!(h.applied(), vec![earlier]);
    }

    #[test]
    fn reset_without_save_fails_cleanly() {
        let h = Rc::new(Harness::new(256));
        let req = Request {
            reset: true,
            ..Request::default()
        };
        let err = run_with(&h, &req).unwrap_err();

        assert!(matches!(err, Error::PersistedGammaMissing(_)));
        assert_eq!(err.exit_code(), 1);
        assert!(h.applied().is_empty());
        assert!(h.saved().is_none());
        assert_eq!(&h.log()[4..], TEARDOWN);
    }

    #[test]
    fn corrupt_save_is_rejected() {
        let h = Rc::new(Harness::new(256));
        std::fs::write(h.dir.path().join(DEFAULT_GAMMA), [0u8; 7]).unwrap();
        let req = Request {
            reset: true,
            ..Request::default()
        };
        let err = run_with(&h, &req).unwrap_err();
        assert!(matches!(err, Error::PersistedGammaCorrupt { found: 7, .. }));
        assert!(h.applied().is_empty());
    }

    #[test]
    fn relative_gamma_scales_saved_default() {
        let h = Rc::new(Harness::new(256));
        let registry = registry(&h);
        let earlier = absolute_ramp(256, Rgb::new(200, 200, 200));
        h.save(&earlier);

        let req = Request {
            identity: true,
            gamma: registry.gamma.selector("relative"),
            ..Request::default()
        };
        run(&req, &registry).unwrap();
        assert_eq!(h.applied(), vec![earlier]);
    }

    #[test]
    fn backends_init_in_order_and_release_in_reverse() {
        let h = Rc::new(Harness::new(256));
        run_with(&h, &Request::default()).unwrap();
        assert_eq!(
            h.log(),
            [
                "init os",
                "init video",
                "init gamma",
                "init time",
                "uninit time",
                "uninit gamma",
                "uninit video",
                "uninit os",
            ]
        );
    }

    #[test]
    fn init_failures_unwind_acquired_backends() {
        let cases = [
            (Capability::Os, 2, vec![]),
            (Capability::Video, 3, vec!["init os", "uninit os"]),
            (
                Capability::Gamma,
                4,
                vec!["init os", "init video", "uninit video", "uninit os"],
            ),
            (
                Capability::Time,
                5,
                vec![
                    "init os",
                    "init video",
                    "init gamma",
                    "uninit gamma",
                    "uninit video",
                    "uninit os",
                ],
            ),
        ];
        for (cap, code, expected) in cases {
            let mut harness = Harness::new(256);
            harness.broken = Some(cap);
            let h = Rc::new(harness);
            let err = run_with(&h, &Request::default()).unwrap_err();
            assert!(matches!(err, Error::BackendUnavailable(c) if c == cap));
            assert_eq!(err.exit_code(), code);
            assert_eq!(h.log(), expected, "{cap}");
            assert!(h.applied().is_empty());
        }
    }

    #[test]
    fn animation_steps_towards_target_then_applies_it() {
        let h = Rc::new(Harness::new(256));
        let req = Request {
            kelvin: 2000,
            animate_ms: 100,
            delay_ms: 25,
            ..Request::default()
        };
        run_with(&h, &req).unwrap();

        let target = absolute_ramp(256, rgb_from_kelvin(2000));
        let applied = h.applied();
        // frames at 0, 25, 50 and 75ms, then the target
        assert_eq!(applied.len(), 5);
        assert_eq!(applied[0], h.live);
        let mut expected = GammaRamp::new(256);
        lerp(&h.live, &target, &mut expected, 50, 100);
        assert_eq!(applied[2], expected);
        assert_eq!(applied[4], target);
    }

    #[test]
    fn delay_longer_than_animation_gives_one_frame() {
        let h = Rc::new(Harness::new(256));
        let req = Request {
            animate_ms: 10,
            delay_ms: 500,
            ..Request::default()
        };
        run_with(&h, &req).unwrap();
        let applied = h.applied();
        assert_eq!(applied.len(), 2);
        assert_eq!(applied[0], h.live);
    }

    #[test]
    fn interrupt_stops_animation_but_still_applies_target() {
        let mut harness = Harness::new(256);
        harness.interrupt_after = Some(2);
        let h = Rc::new(harness);
        let req = Request {
            animate_ms: 1_000,
            delay_ms: 10,
            ..Request::default()
        };
        run_with(&h, &req).unwrap();

        let applied = h.applied();
        assert_eq!(applied.len(), 3);
        assert_eq!(applied[2], absolute_ramp(256, rgb_from_kelvin(3400)));
    }

    #[test]
    fn hints_only_fill_in_auto() {
        let position = |name: &str| (name == "relative").then_some(1);
        assert_eq!(
            hinted(Selector::Auto, Some("relative"), position),
            Selector::Index(1)
        );
        assert_eq!(
            hinted(Selector::Index(0), Some("relative"), position),
            Selector::Index(0)
        );
        assert_eq!(hinted(Selector::Auto, Some("other"), position), Selector::Auto);
        assert_eq!(hinted(Selector::Auto, None, position), Selector::Auto);
    }

    #[test]
    fn os_time_hint_picks_the_clock() {
        let mut harness = Harness::new(256);
        harness.os_time_hint = Some(TOKIO);
        let h = Rc::new(harness);
        run_with(&h, &Request::default()).unwrap();
        assert!(h.log().contains(&"init hinted time".to_string()));

        let h = Rc::new(Harness::new(256));
        run_with(&h, &Request::default()).unwrap();
        assert!(h.log().contains(&"init time".to_string()));
    }

    #[test]
    fn explicit_clock_overrides_os_hint() {
        let mut harness = Harness::new(256);
        harness.os_time_hint = Some(TOKIO);
        let h = Rc::new(harness);
        let req = Request {
            time: Selector::Index(0),
            ..Request::default()
        };
        run_with(&h, &req).unwrap();
        assert!(h.log().contains(&"init time".to_string()));
        assert!(!h.log().contains(&"init hinted time".to_string()));
    }
}
