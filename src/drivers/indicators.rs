//! Feedback outputs: five indicator LEDs and the buzzer.
//!
//! All six lines are active-high push-pull outputs.  [`GpioIndicators`]
//! implements [`FeedbackPort`] over any `embedded_hal` output pin, so the
//! same driver runs on ESP-IDF `PinDriver`s and on host test pins.

use embedded_hal::digital::OutputPin;
use log::warn;

use crate::app::feedback::FeedbackState;
use crate::app::ports::FeedbackPort;

pub struct GpioIndicators<P> {
    pub locked: P,
    pub unlocked: P,
    pub alert: P,
    pub correct: P,
    pub incorrect: P,
    pub buzzer: P,
}

impl<P: OutputPin> GpioIndicators<P> {
    fn drive(pin: &mut P, on: bool, name: &str) {
        let result = if on { pin.set_high() } else { pin.set_low() };
        if result.is_err() {
            warn!("indicators: failed to drive {} {}", name, if on { "high" } else { "low" });
        }
    }
}

impl<P: OutputPin> FeedbackPort for GpioIndicators<P> {
    fn write(&mut self, state: &FeedbackState) {
        Self::drive(&mut self.locked, state.locked_led, "locked LED");
        Self::drive(&mut self.unlocked, state.unlocked_led, "unlocked LED");
        Self::drive(&mut self.alert, state.alert_led, "alert LED");
        Self::drive(&mut self.correct, state.correct_led, "correct LED");
        Self::drive(&mut self.incorrect, state.incorrect_led, "incorrect LED");
        Self::drive(&mut self.buzzer, state.buzzer, "buzzer");
    }
}
