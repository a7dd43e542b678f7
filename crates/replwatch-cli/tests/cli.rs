use assert_cmd::cargo::cargo_bin_cmd;
use serde_json::Value as Json;
use std::{error::Error, fs, path::Path};

fn write(dir: &Path, name: &str, contents: &str) -> Result<String, Box<dyn Error>> {
    let path = dir.join(name);
    fs::write(&path, contents)?;
    Ok(path.to_str().ok_or("utf8 path")?.to_string())
}

fn run_report(args: &[&str]) -> Result<Json, Box<dyn Error>> {
    let mut cmd = cargo_bin_cmd!("replwatch");
    cmd.arg("run").args(args);
    let output = cmd.assert().success().get_output().stdout.clone();
    Ok(serde_json::from_slice(&output)?)
}

#[test]
fn demo_session_runs_cleanly() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let ns = dir.path().join("demo.json");
    let session = dir.path().join("demo.toml");
    cargo_bin_cmd!("replwatch")
        .args(["demo", "--out"])
        .arg(&ns)
        .arg("--session-out")
        .arg(&session)
        .assert()
        .success();

    let report = run_report(&[
        "--namespace",
        ns.to_str().ok_or("utf8 path")?,
        "--session",
        session.to_str().ok_or("utf8 path")?,
        "--ticks",
        "2",
    ])?;
    assert_eq!(report["widgets"].as_array().map(Vec::len), Some(4));
    assert_eq!(report["closed"].as_array().map(Vec::len), Some(0));
    assert_eq!(report["failures"].as_array().map(Vec::len), Some(0));
    assert_eq!(report["widgets"][3]["view"]["output"]["value"], "0");
    Ok(())
}

#[test]
fn scripted_events_move_the_tracker() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let ns = write(
        dir.path(),
        "ns.json",
        r#"{"pos": 0, "win": 3, "series": [0, 1, 2, 3, 4, 5, 6, 7, 8, 9]}"#,
    )?;
    let session = write(
        dir.path(),
        "session.toml",
        r#"
[[widget]]
kind = "range"
tracker = "pos"
window = "win"
data = "series"

[[event]]
tick = 1
widget = 0
event = "forward"
"#,
    )?;
    let out = dir.path().join("after.json");
    run_report(&[
        "--namespace",
        &ns,
        "--session",
        &session,
        "--ticks",
        "2",
        "--out-namespace",
        out.to_str().ok_or("utf8 path")?,
    ])?;
    let after: Json = serde_json::from_str(&fs::read_to_string(out)?)?;
    assert_eq!(after["pos"], 3);
    assert!(after.get("negate").is_none());
    Ok(())
}

#[test]
fn missing_variable_is_reported_as_closed() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let ns = write(dir.path(), "ns.json", r#"{"a": 1}"#)?;
    let session = write(
        dir.path(),
        "session.toml",
        r#"
[[widget]]
kind = "transform"
input = "a"
output = "a_out"

[[widget]]
kind = "graph"
y = "nowhere"
"#,
    )?;
    let report = run_report(&["--namespace", &ns, "--session", &session])?;
    assert_eq!(report["widgets"].as_array().map(Vec::len), Some(1));
    assert_eq!(
        report["closed"][0]["reason"],
        "Variable nowhere not defined in the namespace"
    );
    Ok(())
}

#[test]
fn image_widget_renders_to_png() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let ns = write(dir.path(), "ns.json", r#"{"img": [[0, 64], [128, 255]]}"#)?;
    let session = write(
        dir.path(),
        "session.toml",
        "[[widget]]\nkind = \"image\"\ndata = \"img\"\ncolormap = \"viridis\"\nflip = \"ud\"\n",
    )?;
    let png = dir.path().join("img.png");
    cargo_bin_cmd!("replwatch")
        .args(["render", "--namespace", &ns, "--session", &session, "--out"])
        .arg(&png)
        .assert()
        .success();
    assert!(fs::metadata(&png)?.len() > 0);
    Ok(())
}

#[test]
fn series_files_load_into_the_namespace() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let series = write(dir.path(), "trace.txt", "# trace\n1.0\n3.0\n2.0\n5.0\n")?;
    let session = write(
        dir.path(),
        "session.toml",
        "[[widget]]\nkind = \"transform\"\ninput = \"trace\"\nfunction = \"mean\"\noutput = \"avg\"\n",
    )?;
    let report = run_report(&["--session", &session, "--series", &format!("trace={series}")])?;
    assert_eq!(report["widgets"][0]["view"]["output"]["value"], "2.75");
    assert_eq!(report["widgets"][0]["view"]["labels"]["input"], "trace = [1.0, 3.0, 2.0, 5.0]");
    Ok(())
}

#[test]
fn user_variables_named_like_builtins_survive() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let ns = write(dir.path(), "ns.json", r#"{"offset": [1, 2, 3]}"#)?;
    let session = write(
        dir.path(),
        "session.toml",
        "[[widget]]\nkind = \"graph\"\ny = \"offset\"\n",
    )?;
    let out = dir.path().join("after.json");
    let report = run_report(&[
        "--namespace",
        &ns,
        "--session",
        &session,
        "--out-namespace",
        out.to_str().ok_or("utf8 path")?,
    ])?;
    assert_eq!(report["closed"].as_array().map(Vec::len), Some(0));
    assert_eq!(report["widgets"].as_array().map(Vec::len), Some(1));

    let after: Json = serde_json::from_str(&fs::read_to_string(out)?)?;
    assert_eq!(after["offset"], serde_json::json!([1.0, 2.0, 3.0]));
    assert!(after.get("mean").is_none());
    Ok(())
}

#[test]
fn bad_colormap_fails_to_open() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let session = write(
        dir.path(),
        "session.toml",
        "[[widget]]\nkind = \"image\"\ndata = \"img\"\ncolormap = \"sepia\"\n",
    )?;
    let output = cargo_bin_cmd!("replwatch")
        .args(["run", "--session", &session])
        .assert()
        .failure()
        .get_output()
        .stderr
        .clone();
    let stderr = String::from_utf8(output)?;
    assert!(stderr.contains("opening widget 0 (image)"));
    Ok(())
}

#[test]
fn bad_flip_fails_when_the_widget_opens() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let session = write(
        dir.path(),
        "session.toml",
        "[[widget]]\nkind = \"image\"\ndata = \"img\"\nflip = \"diagonal\"\n",
    )?;
    let output = cargo_bin_cmd!("replwatch")
        .args(["run", "--session", &session])
        .assert()
        .failure()
        .get_output()
        .stderr
        .clone();
    let stderr = String::from_utf8(output)?;
    assert!(stderr.contains("opening widget 0 (image)"));
    assert!(stderr.contains("flip must be one of"));
    Ok(())
}
