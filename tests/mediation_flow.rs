use std::collections::BTreeMap;
use std::sync::Arc;

use clangen_front::bridge::{InMemorySim, LineClient, MediationKind, MediationRequest, SimRuntime};
use clangen_front::logging::{Logger, MemorySink};
use clangen_front::screens::{
    AttemptOutcome, MediationController, MediationView, QueuedNotifier, ScreenContext,
    ScreenPhase, SettingsController,
};
use clangen_front::{FrontMetrics, JsonFileStore, MemoryDocument, Preferences};
use serde_json::{Value, json};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream, duplex};

/// Answer line-protocol requests from an in-memory simulation.
fn serve_sim(stream: DuplexStream, sim: Arc<InMemorySim>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let (read, mut write) = tokio::io::split(stream);
        let mut lines = BufReader::new(read).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            let request: Value = serde_json::from_str(&line).unwrap();
            let id = request["id"].clone();
            let params = request.get("params").cloned().unwrap_or(Value::Null);
            let outcome: Result<Value, String> = match request["method"].as_str().unwrap() {
                "getPossibleMediators" => sim
                    .get_possible_mediators()
                    .await
                    .map(|cats| json!(cats))
                    .map_err(|err| err.to_string()),
                "getPossibleMediated" => sim
                    .get_possible_mediated()
                    .await
                    .map(|cats| json!(cats))
                    .map_err(|err| err.to_string()),
                "getMediatedPairs" => sim
                    .get_mediated_pairs()
                    .await
                    .map(|pairs| json!(pairs))
                    .map_err(|err| err.to_string()),
                "mediate" => {
                    let request: MediationRequest = serde_json::from_value(params).unwrap();
                    sim.mediate(request)
                        .await
                        .map(|text| json!(text))
                        .map_err(|err| err.to_string())
                }
                "getSettings" => sim
                    .get_settings()
                    .await
                    .map(|settings| json!(settings))
                    .map_err(|err| err.to_string()),
                "setSettings" => {
                    let settings: BTreeMap<String, bool> = serde_json::from_value(params).unwrap();
                    sim.set_settings(settings)
                        .await
                        .map(|_| Value::Null)
                        .map_err(|err| err.to_string())
                }
                other => Err(format!("unknown method {other}")),
            };
            let reply = match outcome {
                Ok(result) => json!({ "id": id, "result": result }),
                Err(error) => json!({ "id": id, "error": error }),
            };
            let mut out = reply.to_string();
            out.push('\n');
            write.write_all(out.as_bytes()).await.unwrap();
        }
    })
}

fn connect(sim: Arc<InMemorySim>) -> Arc<dyn SimRuntime> {
    let (client_end, server_end) = duplex(16 * 1024);
    serve_sim(server_end, sim);
    let (read, write) = tokio::io::split(client_end);
    Arc::new(LineClient::connect(read, write))
}

#[tokio::test]
async fn mediation_over_the_line_protocol() {
    let sim = Arc::new(InMemorySim::demo());
    let runtime = connect(sim.clone());
    let notifier = QueuedNotifier::new();
    let sink = MemorySink::new();
    let metrics = FrontMetrics::shared();
    let ctx = ScreenContext {
        notifier: Arc::new(notifier.clone()),
        ..ScreenContext::default()
    }
    .with_logger(Some(Logger::new(sink.clone())))
    .with_metrics(metrics.clone());

    let mut controller = MediationController::new(runtime, ctx);
    let mut document = MemoryDocument::new();
    controller.mount(&mut document).await;
    assert_eq!(controller.possible_mediators().len(), 2);

    assert!(controller.select_mediator("1"));
    assert!(controller.select_subjects(vec!["5".into(), "6".into()]));
    let outcome = controller.attempt(MediationKind::Sabotage).await.unwrap();
    assert_eq!(
        outcome,
        AttemptOutcome::Narrated(
            "Jayfeather quietly stirred up trouble between Berrynose and Poppyfrost.".into()
        )
    );
    assert_eq!(controller.phase(), ScreenPhase::InProgress);

    controller.mediate_again().await;
    assert_eq!(controller.phase(), ScreenPhase::Start);
    assert_eq!(controller.possible_mediators().len(), 1);
    assert!(controller.mediated_pairs()[0].matches("6", "5"));

    // The same pair, now with the other mediator, is refused locally.
    assert!(controller.select_mediator("2"));
    assert!(controller.select_subjects(vec!["6".into(), "5".into()]));
    assert!(!controller.can_attempt());
    assert!(controller.attempt(MediationKind::Mediate).await.is_err());
    assert_eq!(sim.call_count("mediate"), 1);
    assert!(notifier.drain().is_empty());

    let snapshot = metrics.lock().unwrap().snapshot();
    assert_eq!(snapshot.attempts, 1);
    assert!(sink.messages().iter().any(|message| message == "attempt_narrated"));
}

#[tokio::test]
async fn runtime_rejection_alerts_and_restarts() {
    let sim = Arc::new(InMemorySim::demo());
    let runtime = connect(sim.clone());
    let notifier = QueuedNotifier::new();
    let ctx = ScreenContext {
        notifier: Arc::new(notifier.clone()),
        ..ScreenContext::default()
    };

    let mut controller = MediationController::new(runtime, ctx);
    controller.mount(&mut MemoryDocument::new()).await;
    controller.select_mediator("1");
    // No cat 9 exists in the clan.
    controller.select_subjects(vec!["7".into(), "9".into()]);
    let outcome = controller.attempt(MediationKind::Mediate).await.unwrap();

    assert_eq!(outcome, AttemptOutcome::Rejected("Unknown cat 9.".into()));
    assert_eq!(notifier.drain(), vec!["Unknown cat 9."]);
    assert_eq!(controller.phase(), ScreenPhase::Start);
    assert!(controller.selected_mediator().is_none());
    assert!(matches!(controller.view(), MediationView::Ready(_)));
}

#[tokio::test]
async fn settings_persist_across_sessions() {
    let dir = tempfile::tempdir().unwrap();
    let prefs_path = dir.path().join("prefs.json");
    let sim = Arc::new(InMemorySim::demo());

    {
        let runtime = connect(sim.clone());
        let prefs = Preferences::new(JsonFileStore::open(&prefs_path).unwrap());
        let mut settings = SettingsController::new(runtime, prefs, ScreenContext::default());
        let mut document = MemoryDocument::new();
        settings.mount(&mut document).await.unwrap();
        settings.toggle("retirement");
        settings.set_site_theme("theme-clangen-dark");
        settings.toggle_shading();
        settings.save(&mut document).await.unwrap();
    }

    assert_eq!(sim.settings_snapshot().get("retirement"), Some(&true));
    assert!(!sim.settings_snapshot().contains_key("autosave"));

    let runtime = connect(sim.clone());
    let prefs = Preferences::new(JsonFileStore::open(&prefs_path).unwrap());
    let mut settings = SettingsController::new(runtime, prefs, ScreenContext::default());
    settings.mount(&mut MemoryDocument::new()).await.unwrap();
    assert_eq!(settings.site().site_theme, "theme-clangen-dark");
    assert!(settings.site().shading);
    assert!(!settings.site().export_as_zip);
    assert!(
        settings
            .rows()
            .iter()
            .any(|row| row.key == "retirement" && row.checked)
    );
}
