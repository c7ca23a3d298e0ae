//! Attack script tests: loading from disk and rolling into a table

use std::fs;

use macro_tools::attack::{AttackRow, HtmlRenderer};
use macro_tools::config::TableSettings;
use macro_tools::dice::{Roller, ScriptedDice};
use macro_tools::script::{AttackScript, ScriptError};

const FULL_ATTACK: &str = r#"
header = "Valeros - Full Attack"
speaker = "Valeros"

[[rows]]
kind = "attack"
name = "Longsword"
attack = "2d20kh+12"
damage = "1d8+5"
crit_range = 19
crit_damage = "1d8+5+1d6[fire]"

[[rows]]
kind = "attack"
name = "Longsword"
attack = 7
damage = "1d8+5"

[[rows]]
kind = "maneuver"
name = "Trip"
attack = 10
damage = "1d4"
"#;

#[test]
fn test_load_and_roll_script() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("attacks.toml");
    fs::write(&path, FULL_ATTACK).unwrap();

    let script = AttackScript::load(&path).unwrap();
    assert_eq!(script.speaker.as_deref(), Some("Valeros"));
    assert_eq!(script.rows.len(), 3);

    // 2d20kh keeps 19 over 4 and threatens; the confirmation keeps 3 over 2
    let dice = ScriptedDice::new([4, 19, 6, 2, 3, 5, 1, 9, 2, 20, 2]);
    let table = script.build(Roller::new(dice), HtmlRenderer::default()).unwrap();

    let rows = table.rows();
    assert_eq!(rows.len(), 5);
    assert!(matches!(&rows[0], AttackRow::Header { .. }));

    let attack = rows[1].check().unwrap();
    assert_eq!(attack.total, 31);
    assert_eq!(attack.natural, Some(19));
    assert_eq!(rows[1].damage().unwrap().total, 11);

    assert!(rows[2].is_confirmation());
    assert_eq!(rows[2].check().unwrap().formula, "2d20kh+12");
    assert_eq!(rows[2].check().unwrap().total, 15);
    assert_eq!(rows[2].damage().unwrap().total, 11);

    assert_eq!(rows[3].check().unwrap().total, 16);
    assert_eq!(rows[3].damage().unwrap().total, 7);

    assert_eq!(rows[4].check().unwrap().total, 30);
    assert_eq!(rows[4].damage().unwrap().total, 2);
}

#[test]
fn test_script_uses_table_settings() {
    let settings = TableSettings {
        success_color: "gold".to_string(),
        apply_buttons: false,
        ..TableSettings::default()
    };
    let script = AttackScript::parse(
        r#"
        [[rows]]
        kind = "attack"
        name = "Bite"
        attack = 3
        damage = "1d6"
        "#,
    )
    .unwrap();

    let table = script
        .build(Roller::new(ScriptedDice::new([20, 6, 5, 6])), HtmlRenderer::new(settings))
        .unwrap();
    let html = table.render();
    assert!(html.contains("color:gold"));
    assert!(!html.contains("applyDamage"));
}

#[test]
fn test_unknown_row_kind_rejected() {
    let err = AttackScript::parse(
        r#"
        [[rows]]
        kind = "spell"
        name = "Fireball"
        "#,
    )
    .unwrap_err();
    assert!(matches!(err, ScriptError::Invalid(_)));
}
