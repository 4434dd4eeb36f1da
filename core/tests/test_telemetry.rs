#[cfg(test)]
mod telemetry_snapshot_tests {
    use std::time::Duration;

    use cypher_core::telemetry::{Stage, StageTimes, TelemetryCounters, TelemetrySnapshot, TelemetryTimer};

    fn make_counters() -> TelemetryCounters {
        let mut c = TelemetryCounters::default();
        c.add_read(100);
        c.add_read(50);
        c.add_written(128);
        c.add_written(78);
        c
    }

    fn make_timer() -> TelemetryTimer {
        let mut timer = TelemetryTimer::new();
        std::thread::sleep(Duration::from_millis(20)); // ensure elapsed > stage times
        timer.add_stage_time(Stage::Read, Duration::from_millis(5));
        timer.add_stage_time(Stage::Write, Duration::from_millis(10));
        timer.finish();
        timer
    }

    #[test]
    fn counters_accumulate() {
        let c = make_counters();
        assert_eq!(c.chunks, 2);
        assert_eq!(c.bytes_in, 150);
        assert_eq!(c.bytes_out, 206);

        let mut total = TelemetryCounters::default();
        total += c.clone();
        total.merge(&c);
        assert_eq!(total.chunks, 4);
        assert_eq!(total.bytes_out, 412);
    }

    #[test]
    fn snapshot_initializes_output_none() {
        let snapshot = TelemetrySnapshot::from(&make_counters(), &make_timer(), 3);
        assert!(snapshot.output.is_none());
        assert_eq!(snapshot.workers, 3);
    }

    #[test]
    fn attach_output_sets_output_field() {
        let mut snapshot = TelemetrySnapshot::from(&make_counters(), &make_timer(), 1);
        let buf = vec![1, 2, 3, 4];
        snapshot.attach_output(buf.clone());
        assert_eq!(snapshot.output, Some(buf));
    }

    #[test]
    fn throughput_and_overhead_are_computed() {
        let snapshot = TelemetrySnapshot::from(&make_counters(), &make_timer(), 1);
        assert!(snapshot.throughput_bytes_per_sec > 0.0);
        assert_eq!(snapshot.overhead_bytes(), 56);
    }

    #[test]
    fn stage_times_are_carried_over() {
        let snapshot = TelemetrySnapshot::from(&make_counters(), &make_timer(), 1);
        assert_eq!(snapshot.stage(Stage::Read), Duration::from_millis(5));
        assert_eq!(snapshot.total_stage_time(), Duration::from_millis(15));
        assert!(snapshot.has_all_stages(&[Stage::Read, Stage::Write]));
        assert!(!snapshot.has_all_stages(&[Stage::Encrypt]));
        assert!(snapshot.elapsed >= snapshot.total_stage_time());
    }

    #[test]
    fn stage_times_merge_accumulates() {
        let mut a = StageTimes::default();
        a.add(Stage::Encrypt, Duration::from_millis(3));
        let mut b = StageTimes::default();
        b.add(Stage::Encrypt, Duration::from_millis(4));
        b.add(Stage::Write, Duration::from_millis(1));
        a.merge(&b);
        assert_eq!(a.get(Stage::Encrypt), Duration::from_millis(7));
        assert_eq!(a.get_ms(Stage::Write), 1.0);
        assert_eq!(a.get(Stage::Decrypt), Duration::ZERO);
    }

    #[test]
    fn snapshot_serializes_without_output() {
        let mut snapshot = TelemetrySnapshot::from(&make_counters(), &make_timer(), 2);
        snapshot.attach_output(vec![9; 16]);
        let json = snapshot.to_json().unwrap();
        assert!(json.contains("\"bytes_in\":150"));
        assert!(!json.contains("output"));
    }
}
