mod tests {
    use myrtio_city_lights::{
        Category, ClockReading, Error, OnWindow, Phase, PhaseScheduler, target_percent,
    };

    fn at(hour: u8, minute: u8) -> ClockReading {
        ClockReading::new(hour, minute).unwrap()
    }

    fn house(start_hour: u8, end_hour: u8, start_percent: f32, target: f32) -> Phase {
        Phase::new(Category::House, start_hour, end_hour, start_percent, target).unwrap()
    }

    fn assert_close(actual: f32, expected: f32) {
        assert!(
            (actual - expected).abs() < 1e-3,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn test_target_percent_halfway() {
        let phase = house(17, 21, 0.0, 100.0);
        assert_close(target_percent(&phase, at(19, 0)).unwrap(), 50.0);
    }

    #[test]
    fn test_target_percent_endpoints() {
        let phase = house(17, 21, 20.0, 80.0);
        assert_close(target_percent(&phase, at(17, 0)).unwrap(), 20.0);
        assert_close(target_percent(&phase, at(21, 0)).unwrap(), 80.0);
        assert_close(target_percent(&phase, at(22, 30)).unwrap(), 80.0);
    }

    #[test]
    fn test_target_percent_wraparound() {
        let phase = house(22, 6, 80.0, 0.0);
        assert_eq!(phase.duration_minutes().unwrap(), 8 * 60);
        assert_close(target_percent(&phase, at(22, 0)).unwrap(), 80.0);
        assert_close(target_percent(&phase, at(2, 0)).unwrap(), 40.0);
        assert_close(target_percent(&phase, at(6, 0)).unwrap(), 0.0);
    }

    #[test]
    fn test_target_percent_is_monotonic() {
        for start_hour in 0..24 {
            for end_hour in (0..24).filter(|&end_hour| end_hour != start_hour) {
                let rising = house(start_hour, end_hour, 10.0, 90.0);
                let falling = house(start_hour, end_hour, 80.0, 5.0);

                for (phase, increasing) in [(rising, true), (falling, false)] {
                    let mut reading = at(start_hour, 0);
                    let mut previous = target_percent(&phase, reading).unwrap();
                    assert_close(previous, phase.start_percent);

                    let steps = phase.duration_minutes().unwrap() / 10;
                    for _ in 0..steps {
                        reading = reading.advance(10);
                        let current = target_percent(&phase, reading).unwrap();
                        if increasing {
                            assert!(current >= previous, "{reading}: {current} < {previous}");
                        } else {
                            assert!(current <= previous, "{reading}: {current} > {previous}");
                        }
                        previous = current;
                    }

                    assert_eq!(reading, at(end_hour, 0));
                    assert_close(previous, phase.target_percent);
                }
            }
        }
    }

    #[test]
    fn test_full_day_phase() {
        let phase = house(5, 5, 0.0, 100.0);
        assert_eq!(phase.duration_minutes().unwrap(), 24 * 60);
        assert!((0..24).all(|hour| phase.covers(hour)));
        assert_close(target_percent(&phase, at(17, 0)).unwrap(), 50.0);
    }

    #[test]
    fn test_non_positive_duration_is_rejected() {
        let phase = Phase {
            start_hour: 30,
            end_hour: 3,
            start_percent: 0.0,
            target_percent: 100.0,
            category: Category::House,
        };
        assert!(matches!(
            target_percent(&phase, at(2, 0)),
            Err(Error::InvalidPhase { start_hour: 30, end_hour: 3, .. })
        ));
    }

    #[test]
    fn test_invalid_phases_are_rejected() {
        assert!(Phase::new(Category::House, 3, 24, 0.0, 100.0).is_err());
        assert!(Phase::new(Category::House, 3, 5, 0.0, 120.0).is_err());
        assert!(Phase::new(Category::House, 3, 5, f32::NAN, 10.0).is_err());
    }

    #[test]
    fn test_default_schedule_is_valid() {
        let scheduler = PhaseScheduler::default();
        assert_eq!(scheduler.validate(), Ok(()));

        let mut reading = ClockReading::MIDNIGHT;
        for _ in 0..(24 * 6) {
            let targets = scheduler.targets(reading).unwrap();
            for (_, &target) in targets.iter() {
                assert!((0.0..=100.0).contains(&target), "{reading}: {target}");
            }
            reading = reading.advance(10);
        }
    }

    #[test]
    fn test_gated_categories_are_binary() {
        let scheduler = PhaseScheduler::default();

        let noon = scheduler.targets(at(12, 0)).unwrap();
        assert_eq!(noon.commercial, 100.0);
        assert_eq!(noon.street, 0.0);

        let night = scheduler.targets(at(23, 0)).unwrap();
        assert_eq!(night.commercial, 0.0);
        assert_eq!(night.street, 100.0);

        assert_eq!(scheduler.target_for(Category::Street, at(6, 59)), Ok(100.0));
        assert_eq!(scheduler.target_for(Category::Street, at(7, 0)), Ok(0.0));
    }

    #[test]
    fn test_gap_in_phases_is_rejected() {
        let result = PhaseScheduler::new(
            vec![house(0, 12, 0.0, 50.0), house(13, 0, 50.0, 0.0)],
            vec![],
        );
        assert_eq!(
            result.unwrap_err(),
            Error::UncoveredHour {
                category: Category::House,
                hour: 12
            }
        );
    }

    #[test]
    fn test_overlapping_phases_are_rejected() {
        let result = PhaseScheduler::new(
            vec![house(0, 13, 0.0, 50.0), house(12, 0, 50.0, 0.0)],
            vec![],
        );
        assert_eq!(
            result.unwrap_err(),
            Error::OverlappingPhases {
                category: Category::House,
                hour: 12
            }
        );
    }

    #[test]
    fn test_phase_for_gated_category_is_rejected() {
        let shop = Phase::new(Category::Commercial, 8, 20, 0.0, 100.0).unwrap();
        let result = PhaseScheduler::new(vec![house(0, 0, 10.0, 10.0), shop], vec![]);
        assert!(matches!(result, Err(Error::InvalidPhase { .. })));

        let window = OnWindow::new(Category::House, 8, 20).unwrap();
        let result = PhaseScheduler::new(vec![house(0, 0, 10.0, 10.0)], vec![window]);
        assert!(matches!(result, Err(Error::InvalidPhase { .. })));
    }

    #[test]
    fn test_category_without_window_stays_off() {
        let scheduler = PhaseScheduler::new(vec![house(0, 0, 30.0, 30.0)], vec![]).unwrap();
        let targets = scheduler.targets(at(20, 0)).unwrap();
        assert_close(targets.house, 30.0);
        assert_eq!(targets.commercial, 0.0);
        assert_eq!(targets.street, 0.0);
    }
}
