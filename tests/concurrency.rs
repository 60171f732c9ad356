use agio::core::frame::FrameView;
use agio::protocol::message::{build, parse, parse_steering_command, SteeringCommand, TypedMessage};

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_build_parse_heavy() {
    use tokio::task::JoinSet;

    let iterations = 50_000usize;
    let workers = 8u16;

    let mut tasks = JoinSet::new();
    for worker in 0..workers {
        tasks.spawn(async move {
            for i in 0..iterations {
                let cmd = SteeringCommand {
                    speed_kmh: f64::from((i as u16).wrapping_add(worker)) / 10.0,
                    status: (i & 0xFF) as u8,
                    steer_angle_deg: f64::from((i % 6000) as i16 - 3000) / 100.0,
                    cross_track_error_mm: (i % 2000) as i32 - 1000,
                };
                let bytes = build(&cmd).unwrap();
                assert!(FrameView::parse(&bytes).is_some());
                assert_eq!(parse_steering_command(&bytes), Some(cmd.clone()));
                assert_eq!(parse(&bytes), Some(TypedMessage::SteeringCommand(cmd)));
            }
        });
    }

    while let Some(res) = tasks.join_next().await {
        res.unwrap();
    }
}
