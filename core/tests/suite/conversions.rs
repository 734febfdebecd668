//! Every source shape through both delivery channels.

use shift_core::{Eventual, Failure, Shifting, Source, SourceFault, shifting};

use crate::common::{Recorder, assert_is_nope, nope};

// ============================================================================
// Eventual mode
// ============================================================================

async fn settle<T: Send + 'static>(source: Source<T>) -> Result<T, Failure> {
    shifting(None)
        .from(source)
        .expect("eventual mode has no configuration errors")
        .into_eventual()
        .expect("eventual mode returns an eventual")
        .await
}

#[tokio::test]
async fn implicit_value_into_eventual_value() {
    assert_eq!(settle(Source::immediate(|| Ok("VALUE"))).await.unwrap(), "VALUE");
}

#[tokio::test]
async fn implicit_error_into_eventual_error() {
    let err = settle(Source::<()>::immediate(|| Err(nope().into())))
        .await
        .unwrap_err();
    assert_is_nope(&err);
}

#[tokio::test]
async fn callback_value_into_eventual_value() {
    let source = Source::callback(|cb| {
        cb.resolve("VALUE");
    });
    assert_eq!(settle(source).await.unwrap(), "VALUE");
}

#[tokio::test]
async fn callback_error_into_eventual_error() {
    let source = Source::<()>::callback(|cb| {
        cb.reject(nope());
    });
    assert_is_nope(&settle(source).await.unwrap_err());
}

#[tokio::test]
async fn explicit_eventual_value_into_eventual_value() {
    let source = Source::from(Eventual::resolved("VALUE"));
    assert_eq!(settle(source).await.unwrap(), "VALUE");
}

#[tokio::test]
async fn explicit_eventual_error_into_eventual_error() {
    let source = Source::eventual(async { Err::<(), Failure>(nope().into()) });
    assert_is_nope(&settle(source).await.unwrap_err());
}

#[tokio::test]
async fn returned_eventual_is_flattened() {
    let source = Source::flatten(|| {
        Ok(Eventual::new(async {
            tokio::task::yield_now().await;
            Ok::<_, Failure>("VALUE")
        }))
    });
    assert_eq!(settle(source).await.unwrap(), "VALUE");
}

#[tokio::test]
async fn panicking_source_is_a_failure_not_a_crash() {
    let err = settle(Source::<u8>::immediate(|| panic!("sync boom")))
        .await
        .unwrap_err();
    assert_eq!(
        err.downcast_ref::<SourceFault>(),
        Some(&SourceFault::Panicked("sync boom".to_string()))
    );
}

// ============================================================================
// Callback mode
// ============================================================================

#[tokio::test]
async fn callback_value_into_callback_value() {
    let mut recorder = Recorder::new();
    let delivered = recorder
        .adapter
        .from(Source::callback(|cb| {
            cb.resolve("VALUE");
        }))
        .unwrap();
    recorder.mark_returned();

    assert!(delivered.is_callback());
    let delivery = recorder.next().await;
    assert!(delivery.after_return);
    assert_eq!(delivery.result.unwrap(), "VALUE");
}

#[tokio::test]
async fn callback_error_into_callback_error() {
    let mut recorder = Recorder::<&str>::new();
    let delivered = recorder
        .adapter
        .from(Source::callback(|cb| {
            cb.reject(nope());
        }))
        .unwrap();
    recorder.mark_returned();

    assert!(delivered.into_eventual().is_none());
    let delivery = recorder.next().await;
    assert!(delivery.after_return);
    assert_is_nope(&delivery.result.unwrap_err());
}

#[tokio::test]
async fn implicit_value_into_callback_value() {
    let mut recorder = Recorder::new();
    let _ = recorder.adapter.from(Source::immediate(|| Ok(7))).unwrap();
    recorder.mark_returned();

    let delivery = recorder.next().await;
    assert!(delivery.after_return);
    assert_eq!(delivery.result.unwrap(), 7);
}

#[tokio::test]
async fn implicit_error_into_callback_error() {
    let mut recorder = Recorder::<u8>::new();
    let _ = recorder
        .adapter
        .from(Source::immediate(|| Err(nope().into())))
        .unwrap();
    recorder.mark_returned();

    let delivery = recorder.next().await;
    assert!(delivery.after_return);
    assert_is_nope(&delivery.result.unwrap_err());
}

#[tokio::test]
async fn eventual_value_into_callback_value() {
    let mut recorder = Recorder::new();
    let (eventual, continuation) = Eventual::pending();
    let _ = recorder.adapter.from(eventual).unwrap();
    recorder.mark_returned();

    continuation.resolve("VALUE");
    let delivery = recorder.next().await;
    assert!(delivery.after_return);
    assert_eq!(delivery.result.unwrap(), "VALUE");
}

#[tokio::test]
async fn eventual_error_into_callback_error() {
    let mut recorder = Recorder::<&str>::new();
    let _ = recorder.adapter.from(Eventual::rejected(nope())).unwrap();
    recorder.mark_returned();

    let delivery = recorder.next().await;
    assert!(delivery.after_return);
    assert_is_nope(&delivery.result.unwrap_err());
}

#[tokio::test]
async fn repeated_settlement_delivers_once() {
    let mut recorder = Recorder::new();
    let _ = recorder
        .adapter
        .from(Source::callback(|cb| {
            assert!(cb.resolve("first"));
            assert!(!cb.resolve("second"));
            assert!(!cb.reject(nope()));
        }))
        .unwrap();
    recorder.mark_returned();

    assert_eq!(recorder.next().await.result.unwrap(), "first");
    assert!(!recorder.has_extra().await);
}

#[tokio::test]
async fn abandoned_callback_source_reports_failure() {
    let mut recorder = Recorder::<u8>::new();
    let _ = recorder.adapter.from(Source::callback(drop)).unwrap();
    recorder.mark_returned();

    let err = recorder.next().await.result.unwrap_err();
    assert_eq!(
        err.downcast_ref::<SourceFault>(),
        Some(&SourceFault::Abandoned)
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn callback_delivery_on_multi_thread_runtime() {
    let mut recorder = Recorder::new();
    let _ = recorder
        .adapter
        .from(Source::callback(|cb| {
            tokio::spawn(async move {
                cb.resolve(99_u32);
            });
        }))
        .unwrap();
    recorder.mark_returned();

    let delivery = recorder.next().await;
    assert!(delivery.after_return);
    assert_eq!(delivery.result.unwrap(), 99);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn immediate_values_never_arrive_before_return_on_multi_thread_runtime() {
    for n in 0..200_u32 {
        let mut recorder = Recorder::new();
        let _ = recorder.adapter.from(Source::immediate(move || Ok(n))).unwrap();
        recorder.mark_returned();

        let delivery = recorder.next().await;
        assert!(delivery.after_return, "delivery {n} arrived before from returned");
        assert_eq!(delivery.result.unwrap(), n);
    }
}

#[test]
fn callback_mode_outside_runtime_is_a_configuration_error() {
    let adapter = Shifting::with_callback(|_: Result<(), Failure>| {});
    assert_eq!(
        adapter.from(Source::immediate(|| Ok(()))).unwrap_err(),
        shift_core::ShiftError::NoRuntime
    );
}
