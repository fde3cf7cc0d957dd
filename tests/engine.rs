mod tests {
    use myrtio_city_lights::{
        Category, ClockReading, Config, Direction, Engine, EngineOptions, Error, FixtureLayout,
        LightIntent, LightVector, MemoryStorage, pack,
    };

    fn engine_with(json: &str) -> Engine<MemoryStorage> {
        Engine::boot(MemoryStorage::with_contents(json), EngineOptions::default()).unwrap()
    }

    fn at(hour: u8, minute: u8) -> ClockReading {
        ClockReading::new(hour, minute).unwrap()
    }

    #[test]
    fn test_boot_starts_dark() {
        let engine = engine_with(r#"{"ledCount":"12"}"#);
        assert_eq!(engine.lights(), &LightVector::zeroed(12));
        assert_eq!(engine.layout().len(), 12);
        assert_eq!(engine.speed(), 0);
    }

    #[test]
    fn test_invalid_leds_are_rejected() {
        let mut engine = engine_with(r#"{"ledCount":"3"}"#);
        engine.set_leds("010").unwrap();

        assert!(matches!(engine.set_leds("102"), Err(Error::InvalidInput(_))));
        assert!(matches!(engine.set_leds("0101"), Err(Error::InvalidInput(_))));
        assert_eq!(engine.lights().to_string(), "010");
    }

    #[test]
    fn test_set_leds_replaces_vector() {
        let mut engine = engine_with(r#"{"ledCount":"8"}"#);
        engine.set_leds("00000001").unwrap();

        assert_eq!(engine.lights().to_string(), "00000001");
        assert_eq!(engine.frame().bytes, &[0x01]);
    }

    #[test]
    fn test_led_count_change_resets_and_reallocates() {
        let mut engine = engine_with(r#"{"ledCount":"8"}"#);
        engine.set_leds("11111111").unwrap();
        assert_eq!(engine.frame().bytes, &[0xFF]);
        let allocations = engine.packer().allocations();

        assert_eq!(engine.set_led_count(16), Ok(true));
        assert_eq!(engine.packer().bits(), None);
        assert_eq!(engine.lights(), &LightVector::zeroed(16));

        let frame = engine.frame();
        assert_eq!(frame.bytes, &[0x00, 0x00]);
        assert_eq!(engine.packer().allocations(), allocations + 1);

        assert_eq!(engine.config().led_count, 16);
        assert!(engine.storage().contents().unwrap().contains(r#""ledCount":"16""#));
    }

    #[test]
    fn test_led_count_bounds() {
        let mut engine = engine_with("{}");
        assert!(engine.set_led_count(0).is_err());
        assert!(engine.set_led_count(100_000).is_err());
        assert_eq!(engine.set_led_count(8), Ok(false));
    }

    #[test]
    fn test_speed_is_clamped_to_limit() {
        let mut engine = engine_with(r#"{"speedLimit":"200"}"#);
        assert_eq!(engine.set_speed(300), 200);
        assert_eq!(engine.set_speed(-5), 0);
        assert_eq!(engine.set_speed(150), 150);

        engine.set_speed_limit(100);
        assert_eq!(engine.speed(), 100);
        assert_eq!(engine.config().speed_limit, 100);
    }

    #[test]
    fn test_reverse_direction() {
        let mut engine = engine_with("{}");
        assert_eq!(engine.direction(), Direction::Forward);
        assert_eq!(engine.reverse_direction(), Direction::Reverse);
        assert_eq!(engine.reverse_direction(), Direction::Forward);
    }

    #[test]
    fn test_brightness_is_persisted_and_framed() {
        let mut engine = engine_with("{}");
        assert!(engine.set_brightness(40));
        assert!(!engine.set_brightness(40));

        assert_eq!(engine.frame().brightness, 40);
        let stored = Config::from_json(engine.storage().contents().unwrap()).unwrap();
        assert_eq!(stored.led_brightness, 40);
    }

    #[test]
    fn test_failed_persistence_keeps_change() {
        let mut engine = engine_with("{}");
        engine.storage_mut().set_failing(true);

        assert!(engine.set_brightness(12));
        assert_eq!(engine.config().led_brightness, 12);
    }

    #[test]
    fn test_time_zone_offset_range() {
        let mut engine = engine_with("{}");
        assert!(engine.set_time_zone_offset(-8).is_ok());
        assert!(engine.set_time_zone_offset(20).is_err());
        assert_eq!(engine.config().time_zone_offset, -8);
    }

    #[test]
    fn test_tick_follows_schedule() {
        let mut engine = engine_with(r#"{"ledCount":"20"}"#);

        let report = engine.tick(at(12, 0)).unwrap();
        let commercial = engine.layout().indices(Category::Commercial).to_vec();
        let street = engine.layout().indices(Category::Street).to_vec();
        assert_eq!(engine.lights().count_on_in(&commercial), commercial.len());
        assert_eq!(engine.lights().count_on_in(&street), 0);

        let houses = engine.layout().indices(Category::House).len() as f32;
        let realized = report.changes.house.percent();
        assert!((realized - report.targets.house).abs() <= 100.0 / houses + 1e-3);

        engine.tick(at(23, 0)).unwrap();
        assert_eq!(engine.lights().count_on_in(&commercial), 0);
        assert_eq!(engine.lights().count_on_in(&street), street.len());
    }

    #[test]
    fn test_tick_keeps_every_category_in_bounds() {
        let mut engine = engine_with(r#"{"ledCount":"40"}"#);
        let mut reading = ClockReading::MIDNIGHT;

        for _ in 0..(2 * 24 * 6) {
            let report = engine.tick(reading).unwrap();
            for (category, change) in report.changes.iter() {
                let target = *report.targets.get(category);
                assert!(
                    (change.percent() - target).abs() <= 100.0 / change.total as f32 + 1e-3,
                    "{reading} {category}: {} vs {target}",
                    change.percent()
                );
            }
            reading = reading.advance(10);
        }
    }

    #[test]
    fn test_restore_from_frame() {
        let mut engine = engine_with(r#"{"ledCount":"10"}"#);
        let previous = LightVector::parse("1000000001").unwrap();

        engine.restore(&pack(&previous)).unwrap();
        assert_eq!(engine.lights(), &previous);
        assert!(engine.restore(&[0xFF]).is_err());
    }

    #[test]
    fn test_custom_layout() {
        let mut engine = engine_with(r#"{"ledCount":"4"}"#);
        let layout = FixtureLayout::new(4, vec![3], vec![0, 2], vec![1]).unwrap();
        engine.set_layout(layout).unwrap();

        engine.tick(at(12, 0)).unwrap();
        assert_eq!(engine.lights().get(0), Some(true));
        assert_eq!(engine.lights().get(1), Some(false));
        assert_eq!(engine.lights().get(2), Some(true));

        let wrong = FixtureLayout::new(2, vec![0], vec![1], vec![]).unwrap();
        assert!(engine.set_layout(wrong).is_err());
    }

    #[test]
    fn test_led_count_change_drops_custom_layout() {
        let mut engine = engine_with(r#"{"ledCount":"4"}"#);
        assert!(!engine.has_custom_layout());

        let layout = FixtureLayout::new(4, vec![3], vec![0, 2], vec![1]).unwrap();
        engine.set_layout(layout).unwrap();
        assert!(engine.has_custom_layout());

        engine.set_led_count(8).unwrap();
        assert!(!engine.has_custom_layout());
        assert_eq!(
            engine.layout(),
            &FixtureLayout::proportional(8, Default::default())
        );
    }

    #[test]
    fn test_layout_must_partition_chain() {
        assert!(FixtureLayout::new(3, vec![0, 1], vec![1], vec![2]).is_err());
        assert!(FixtureLayout::new(3, vec![0], vec![1], vec![]).is_err());
        assert!(FixtureLayout::new(3, vec![0], vec![1], vec![3]).is_err());

        let layout = FixtureLayout::proportional(8, Default::default());
        assert_eq!(layout.indices(Category::House), &[0, 1, 2, 3]);
        assert_eq!(layout.indices(Category::Commercial), &[4, 5]);
        assert_eq!(layout.indices(Category::Street), &[6, 7]);
        assert_eq!(layout.category_of(5), Some(Category::Commercial));
    }

    #[test]
    fn test_apply_intents() {
        let mut engine = engine_with(r#"{"ledCount":"4"}"#);

        assert_eq!(engine.apply(LightIntent::leds("1001").unwrap()), Ok(true));
        assert_eq!(engine.apply(LightIntent::SetSpeed(42)), Ok(false));
        assert_eq!(engine.apply(LightIntent::SetBrightness(7)), Ok(true));
        assert_eq!(engine.apply(LightIntent::ReverseDirection), Ok(false));
        assert!(engine.apply(LightIntent::leds("10").unwrap()).is_err());

        assert_eq!(engine.lights().to_string(), "1001");
        assert_eq!(engine.speed(), 42);
        assert_eq!(engine.direction(), Direction::Reverse);
    }
}
