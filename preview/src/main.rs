//! Desktop preview app for myrtio-city-lights
//!
//! Runs the lighting engine on an accelerated clock and draws every fixture
//! of the chain, colored by its category.
//! All state changes go through the intent queue, like on the device.

use std::time::Instant as StdInstant;

use eframe::egui::{self};
use myrtio_city_lights::{
    Category, ClockReading, Duration, Engine, EngineOptions, Frame, HardwareOutput, Instant,
    IntentQueue, IntentSender, LightIntent, MemoryStorage, SimulatedClock, TickReport,
    TickScheduler, config::MAX_LED_COUNT, unpack,
};

/// Largest chain the preview lets you configure
const MAX_PREVIEW_LEDS: usize = 256;

/// Size of each fixture rectangle in pixels
const LED_SIZE: f32 = 18.0;

/// Gap between fixtures
const LED_GAP: f32 = 3.0;

/// Wall-clock time between two simulated ticks at speed 1.0
const PREVIEW_TICK_INTERVAL: Duration = Duration::from_millis(500);

/// Intent queue size
const INTENT_CHANNEL_SIZE: usize = 16;

/// Static intent queue for communication between UI and tick loop
static INTENTS: IntentQueue<INTENT_CHANNEL_SIZE> = IntentQueue::new();

type PreviewScheduler = TickScheduler<
    'static,
    SimulatedClock,
    PreviewOutput,
    MemoryStorage,
    INTENT_CHANNEL_SIZE,
>;

/// Keeps the last frame shifted into the chain
#[derive(Default)]
struct PreviewOutput {
    bytes: Vec<u8>,
    brightness: u8,
    frames: u64,
}

impl HardwareOutput for PreviewOutput {
    fn render(&mut self, frame: Frame<'_>) {
        self.bytes.clear();
        self.bytes.extend_from_slice(frame.bytes);
        self.brightness = frame.brightness;
        self.frames += 1;
    }
}

fn main() -> eframe::Result<()> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([900.0, 600.0])
            .with_title("City Lights Preview"),
        ..Default::default()
    };

    eframe::run_native(
        "myrtio-city-lights-preview",
        options,
        Box::new(|_cc| Ok(Box::new(PreviewApp::new()?))),
    )
}

struct PreviewApp {
    scheduler: PreviewScheduler,
    intent_sender: IntentSender<'static, INTENT_CHANNEL_SIZE>,

    /// Synthetic time in milliseconds
    t_ms: u64,
    /// Wall-clock reference for delta time
    last_frame: StdInstant,
    /// Synthetic time of the next tick
    next_tick: Instant,
    playing: bool,
    /// Time scale multiplier (1.0 = one tick per interval)
    time_scale: f32,
    /// Simulated minutes per tick
    step_minutes: u16,
    brightness: u8,
    led_count: usize,
    /// Bit string typed into the editor
    bits: String,
    /// Last rejected edit
    bits_error: Option<String>,
    last_report: Option<TickReport>,
}

impl PreviewApp {
    fn new() -> myrtio_city_lights::Result<Self> {
        let engine = Engine::boot(MemoryStorage::new(), EngineOptions::default())?;
        let brightness = engine.config().led_brightness;
        let led_count = engine.config().led_count;
        let bits = engine.lights().to_string();

        let clock = SimulatedClock::new(ClockReading::new(6, 0)?, 10);
        let step_minutes = clock.step_minutes();
        let scheduler = TickScheduler::with_tick_interval(
            engine,
            clock,
            PreviewOutput::default(),
            INTENTS.receiver(),
            PREVIEW_TICK_INTERVAL,
        );

        Ok(Self {
            scheduler,
            intent_sender: INTENTS.sender(),
            t_ms: 0,
            last_frame: StdInstant::now(),
            next_tick: Instant::from_millis(0),
            playing: true,
            time_scale: 1.0,
            step_minutes,
            brightness,
            led_count,
            bits,
            bits_error: None,
            last_report: None,
        })
    }

    fn send(&self, intent: LightIntent) {
        let _ = self.intent_sender.try_send(intent);
    }

    /// Validate the edited bit string and queue it
    fn send_bits(&mut self) {
        match LightIntent::leds(self.bits.trim()) {
            Ok(intent) if self.bits.trim().len() == self.led_count => {
                self.bits_error = None;
                self.send(intent);
            }
            Ok(_) => {
                self.bits_error = Some(format!(
                    "expected {} characters, got {}",
                    self.led_count,
                    self.bits.trim().len()
                ));
            }
            Err(err) => self.bits_error = Some(err.to_string()),
        }
    }

    /// Update synthetic time based on wall clock and time scale
    fn update_time(&mut self) {
        let now = StdInstant::now();
        let delta = now.duration_since(self.last_frame);
        self.last_frame = now;

        if self.playing {
            let delta_ms = delta.as_secs_f64() * 1000.0 * f64::from(self.time_scale);
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let delta_ms = if delta_ms.is_finite() {
                delta_ms.max(0.0) as u64
            } else {
                0
            };
            self.t_ms = self.t_ms.wrapping_add(delta_ms);
        }
    }

    /// Run the tick loop up to the current synthetic time
    fn step(&mut self) {
        self.scheduler.process_intents();

        let now = Instant::from_millis(self.t_ms);
        if self.playing && now >= self.next_tick {
            let result = self.scheduler.tick(now);
            self.next_tick = result.next_deadline;
            if result.report.is_some() {
                self.last_report = result.report;
            }
        }
    }

    /// Fixture states as seen by the chain
    fn shown_states(&self) -> Vec<bool> {
        let output = self.scheduler.output();
        let len = self.scheduler.engine().config().led_count;
        unpack(&output.bytes, len)
            .map(|lights| lights.iter().collect())
            .unwrap_or_default()
    }
}

fn category_color(category: Option<Category>) -> egui::Color32 {
    match category {
        Some(Category::House) => egui::Color32::from_rgb(255, 196, 92),
        Some(Category::Commercial) => egui::Color32::from_rgb(186, 220, 255),
        Some(Category::Street) => egui::Color32::from_rgb(255, 140, 40),
        None => egui::Color32::GRAY,
    }
}

impl eframe::App for PreviewApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.update_time();
        self.step();

        // Request continuous repaint for animation
        ctx.request_repaint();

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.horizontal(|ui| {
                // <PlaybackControls>
                ui.vertical(|ui| {
                    ui.horizontal(|ui| {
                        if ui
                            .button(if self.playing { "⏸ Pause" } else { "▶ Play" })
                            .clicked()
                        {
                            self.playing = !self.playing;
                        }
                        if ui.button("⏭ Tick").clicked() {
                            self.next_tick = Instant::from_millis(0);
                            let playing = self.playing;
                            self.playing = true;
                            self.step();
                            self.playing = playing;
                        }
                    });

                    ui.add_space(4.0);

                    ui.horizontal(|ui| {
                        ui.label("Speed:");
                        ui.add(
                            egui::Slider::new(&mut self.time_scale, 0.1..=20.0).logarithmic(true),
                        );
                    });

                    ui.add_space(4.0);

                    ui.horizontal(|ui| {
                        ui.label("Minutes per tick:");
                        let old_step = self.step_minutes;
                        ui.add(egui::Slider::new(&mut self.step_minutes, 1..=60));
                        if self.step_minutes != old_step {
                            self.scheduler
                                .clock_mut()
                                .set_step_minutes(self.step_minutes);
                        }
                    });
                });
                // </PlaybackControls>
                ui.add_space(16.0);
                // <ChainControls>
                ui.vertical(|ui| {
                    ui.horizontal(|ui| {
                        ui.label("Brightness:");
                        let old_brightness = self.brightness;
                        ui.add(egui::DragValue::new(&mut self.brightness).range(0u8..=255u8));
                        if self.brightness != old_brightness {
                            self.send(LightIntent::SetBrightness(self.brightness));
                        }
                    });

                    ui.add_space(4.0);

                    ui.horizontal(|ui| {
                        ui.label("Fixtures:");
                        let old_led_count = self.led_count;
                        ui.add(egui::Slider::new(
                            &mut self.led_count,
                            1usize..=MAX_PREVIEW_LEDS.min(MAX_LED_COUNT),
                        ));
                        if self.led_count != old_led_count {
                            self.send(LightIntent::SetLedCount(self.led_count));
                            self.bits = "0".repeat(self.led_count);
                        }
                    });
                });
                // </ChainControls>
            });

            ui.add_space(12.0);

            ui.horizontal(|ui| {
                ui.label("States:");
                let response = ui.add(
                    egui::TextEdit::singleline(&mut self.bits)
                        .font(egui::TextStyle::Monospace)
                        .desired_width(ui.available_width() - 160.0),
                );
                let submitted =
                    response.lost_focus() && ui.input(|input| input.key_pressed(egui::Key::Enter));
                if ui.button("Apply").clicked() || submitted {
                    self.send_bits();
                }
                if ui.button("Read back").clicked() {
                    self.bits = self.scheduler.engine().lights().to_string();
                    self.bits_error = None;
                }
            });
            if let Some(err) = &self.bits_error {
                ui.colored_label(egui::Color32::LIGHT_RED, err);
            }

            ui.add_space(12.0);

            if let Some(report) = &self.last_report {
                ui.label(format!(
                    "{}   house {:.1}% ({}/{})   commercial {:.0}% ({}/{})   street {:.0}% ({}/{})",
                    report.reading,
                    report.targets.house,
                    report.changes.house.on_count,
                    report.changes.house.total,
                    report.targets.commercial,
                    report.changes.commercial.on_count,
                    report.changes.commercial.total,
                    report.targets.street,
                    report.changes.street.on_count,
                    report.changes.street.total,
                ));
            }
            let engine = self.scheduler.engine();
            ui.label(format!(
                "Track speed {} ({:?}), frames sent {}",
                engine.speed(),
                engine.direction(),
                self.scheduler.output().frames
            ));

            ui.add_space(16.0);

            // === Fixture Display ===
            let states = self.shown_states();
            let layout = self.scheduler.engine().layout();
            let alpha = self.scheduler.output().brightness;

            let available_width = ui.available_width();
            let led_pitch = LED_SIZE + LED_GAP;
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let leds_per_row = (available_width / led_pitch).floor().max(1.0) as usize;
            let rows = states.len().div_ceil(leds_per_row);
            #[allow(clippy::cast_precision_loss)]
            let height = rows as f32 * led_pitch;

            let (response, painter) = ui.allocate_painter(
                egui::vec2(available_width, height),
                egui::Sense::hover(),
            );
            let origin = response.rect.min;

            #[allow(clippy::cast_precision_loss)]
            for (i, on) in states.iter().enumerate() {
                let row = i / leds_per_row;
                let col = i % leds_per_row;
                let x = origin.x + col as f32 * led_pitch;
                let y = origin.y + row as f32 * led_pitch;

                let rect = egui::Rect::from_min_size(
                    egui::pos2(x, y),
                    egui::vec2(LED_SIZE, LED_SIZE),
                );
                let base = category_color(layout.category_of(i));
                if *on {
                    painter.rect_filled(rect, 3.0, base.gamma_multiply(f32::from(alpha) / 255.0));
                } else {
                    painter.rect_filled(rect, 3.0, egui::Color32::from_gray(30));
                    painter.rect_stroke(
                        rect,
                        3.0,
                        egui::Stroke::new(1.0, base.gamma_multiply(0.35)),
                        egui::StrokeKind::Inside,
                    );
                }
            }
        });
    }
}
