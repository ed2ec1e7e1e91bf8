//! End-to-end exercises of the public API over synthetic capture files.

use anyhow::{Context, ensure};
use raceline::probe::StaticSimStatus;
use raceline::test_utils::{IbtBuilder, RegionBuilder, TestVar};
use raceline::{Client, IbtReader, SdkError, Value, VarType};

fn fixture() -> RegionBuilder {
    RegionBuilder::new()
        .tick_counts(&[105, 107, 106])
        .session_info_update(3)
        .var(TestVar::scalar("SessionNum", VarType::Int32).value(Value::Int32(1)))
        .var(TestVar::scalar("Speed", VarType::Float32).unit("m/s").per_buffer(vec![
            Value::Float32(51.0),
            Value::Float32(53.0),
            Value::Float32(52.0),
        ]))
        .var(TestVar::scalar("OnPitRoad", VarType::Bool).value(Value::Bool(false)))
        .var(TestVar::scalar("SessionFlags", VarType::UInt32).value(Value::UInt32(0x4004)))
        .session_info(
            "---\nWeekendInfo:\n TrackName: okayama full\n TrackID: 166\n\n\
DriverInfo:\n DriverCarIdx: 11\n\n...\n",
        )
}

fn write_fixture(builder: &RegionBuilder) -> tempfile::NamedTempFile {
    let file = tempfile::NamedTempFile::new().unwrap();
    std::fs::write(file.path(), builder.build()).unwrap();
    file
}

#[tokio::test]
async fn full_live_style_session_over_a_capture_file() {
    let file = write_fixture(&fixture());
    let mut client = Client::with_probe(StaticSimStatus(false));

    assert!(client.startup(Some(file.path()), None).await.unwrap());
    assert!(client.is_connected().await.unwrap());
    assert_eq!(client.session_info_update().unwrap(), 3);

    // live reads come from the second-largest tick buffer (tick 106)
    let speed = client.get("Speed").await.unwrap().unwrap();
    assert_eq!(speed.as_var().unwrap().as_f32(), Some(52.0));

    // freezing pins the newest completed buffer (tick 107)
    client.freeze_var_buffer_latest().await.unwrap();
    let speed = client.get("Speed").await.unwrap().unwrap();
    assert_eq!(speed.as_var().unwrap().as_f32(), Some(53.0));

    // flags decode through the bitfield types
    let flags = client.get("SessionFlags").await.unwrap().unwrap();
    let bits = flags.as_var().unwrap().as_u32().unwrap();
    let flags = raceline::Flags::from_bits_truncate(bits);
    assert!(flags.contains(raceline::Flags::GREEN | raceline::Flags::CAUTION));

    // session metadata resolves through the per-key cache
    let weekend = client.get("WeekendInfo").await.unwrap().unwrap();
    let weekend = weekend.as_session().unwrap();
    assert_eq!(weekend.get("TrackName").unwrap().as_str(), Some("okayama full"));
    assert_eq!(weekend.get("TrackID").unwrap().as_i64(), Some(166));
    assert_eq!(client.get_session_info_update_by_key("WeekendInfo"), Some(3));

    client.unfreeze_var_buffer_latest();
    client.shutdown();
    assert!(matches!(client.get("Speed").await, Err(SdkError::Detached)));
}

#[tokio::test]
async fn session_cache_follows_the_update_counter() {
    let before = write_fixture(&fixture());
    let mut client = Client::with_probe(StaticSimStatus(false));
    assert!(client.startup(Some(before.path()), None).await.unwrap());

    let first = client.get("WeekendInfo").await.unwrap().unwrap();

    // identical counter: the cached fragment is served unchanged
    let second = client.get("WeekendInfo").await.unwrap().unwrap();
    assert_eq!(first, second);
    assert_eq!(client.get_session_info_update_by_key("WeekendInfo"), Some(3));
}

#[tokio::test]
async fn dump_writes_a_reattachable_region() {
    let builder = fixture();
    let file = write_fixture(&builder);
    let dump = tempfile::NamedTempFile::new().unwrap();

    let mut client = Client::with_probe(StaticSimStatus(false));
    assert!(client.startup(Some(file.path()), Some(dump.path())).await.unwrap());
    client.shutdown();

    // the dump must itself be a valid region
    let mut second = Client::with_probe(StaticSimStatus(false));
    assert!(second.startup(Some(dump.path()), None).await.unwrap());
    let speed = second.get("Speed").await.unwrap().unwrap();
    assert_eq!(speed.as_var().unwrap().as_f32(), Some(52.0));
}

#[tokio::test]
async fn parse_to_emits_document_then_sorted_values() {
    let file = write_fixture(&fixture());
    let mut client = Client::with_probe(StaticSimStatus(false));
    assert!(client.startup(Some(file.path()), None).await.unwrap());

    let out = tempfile::NamedTempFile::new().unwrap();
    client.parse_to(out.path()).await.unwrap();
    let text = std::fs::read_to_string(out.path()).unwrap();

    assert!(text.contains("TrackName: okayama full"));

    // values are sorted case-insensitively by variable name
    let on_pit = text.find("OnPitRoad").unwrap();
    let flags = text.find("SessionFlags").unwrap();
    let speed = text.rfind("Speed").unwrap();
    assert!(on_pit < flags && flags < speed);
    assert!(text.contains(&format!("{:<32}{}", "Speed", "52")));
}

#[test]
fn recording_reader_round_trip() -> anyhow::Result<()> {
    let bytes = IbtBuilder::new()
        .session_info("---\nWeekendInfo:\n TrackName: spa\n\n...\n")
        .lap_count(1)
        .var(TestVar::scalar("Gear", VarType::Int32))
        .var(TestVar::scalar("Throttle", VarType::Float32))
        .record(vec![Value::Int32(1), Value::Float32(0.2)])
        .record(vec![Value::Int32(2), Value::Float32(0.9)])
        .build();

    let file = tempfile::NamedTempFile::new()?;
    std::fs::write(file.path(), &bytes)?;

    let reader = IbtReader::open(file.path())
        .with_context(|| format!("Opening {}", file.path().display()))?;
    ensure!(reader.record_count() == 2, "recording should hold both records");
    assert_eq!(reader.get(0, "Gear")?, Value::Int32(1));
    assert_eq!(reader.get_all("Throttle")?, vec![Value::Float32(0.2), Value::Float32(0.9)]);
    assert_eq!(reader.latest("Gear")?, Value::Int32(2));
    let yaml = reader.session_yaml().context("recording should embed a session document")?;
    ensure!(yaml.contains("spa"), "session document should survive the round trip");
    assert!(matches!(reader.get(2, "Gear"), Err(SdkError::OutOfBounds { .. })));
    reader.close();
    Ok(())
}
