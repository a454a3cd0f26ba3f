use rand::{rngs::StdRng, SeedableRng};

use super::*;

fn person(id: u64) -> Person {
    Person::new(id, format!("U{id:03}"), format!("Person {id}"), format!("1380000{id:04}"))
}

#[test]
fn parses_short_and_long_hex_colors() {
    assert_eq!(
        Color::from_hex("#fff"),
        Some(Color::WHITE)
    );
    let color = Color::from_hex("#1b66c9").expect("color");
    assert_eq!((color.r, color.g, color.b), (0x1b, 0x66, 0xc9));
    assert_eq!(Color::from_hex("1b66c9"), None);
    assert_eq!(Color::from_hex("#zzzzzz"), None);
}

#[test]
fn roster_pads_small_member_lists_by_cycling() {
    let people = vec![person(1), person(2), person(3)];
    let roster = table_roster(&people, 2);
    assert_eq!(roster.len(), 14);
    assert_eq!(roster[3].as_ref().map(|p| p.id), Some(1));
    assert!(roster.iter().all(Option::is_some));
}

#[test]
fn roster_keeps_large_member_lists_whole() {
    let people: Vec<Person> = (1..=60).map(person).collect();
    assert_eq!(table_roster(&people, 7).len(), 60);
}

#[test]
fn roster_without_people_is_blank() {
    let roster = table_roster(&[], 3);
    assert_eq!(roster.len(), 21);
    assert!(roster.iter().all(Option::is_none));
}

#[test]
fn pattern_cards_use_pattern_color_only_on_the_table() {
    let palette = Palette {
        pattern_list: vec![2],
        ..Palette::default()
    };
    assert_eq!(palette.background(1, SkinMode::Default, 1.0), palette.pattern());
    assert_eq!(palette.background(1, SkinMode::Sphere, 1.0), palette.card());
    assert_eq!(palette.background(0, SkinMode::Default, 1.0), palette.card());
}

#[test]
fn assign_binds_face_and_lucky_restyle_keeps_it() {
    let palette = Palette::default();
    let mut card = CardObject::new(4, Transform::default(), &palette);
    let winner = person(9);
    card.assign(Some(&winner), &palette, SkinMode::Default, 1.0, 1.0);
    card.restyle(&palette, SkinMode::Lucky, 1.5, 0.8);

    assert_eq!(card.skin.person_id, Some(9));
    assert_eq!(card.skin.face.as_ref().map(|f| f.detail.as_str()), Some("138****0009"));
    assert_eq!(card.skin.mode, SkinMode::Lucky);
    assert_eq!(card.skin.scale, 1.5);
    assert_eq!(card.skin.background, palette.lucky().with_alpha(0.8));
    assert_eq!(card.index(), 4);
}

#[test]
fn populate_scatters_cards_inside_the_cube() {
    let mut rng = StdRng::seed_from_u64(3);
    let roster = table_roster(&[person(1)], 1);
    let mut scene = Scene::new();
    scene.populate(&roster, &Palette::default(), &mut rng);

    assert_eq!(scene.len(), 7);
    for (index, card) in scene.cards().iter().enumerate() {
        assert_eq!(card.index(), index);
        let p = card.transform.position;
        assert!(p.x.abs() <= SCATTER_EXTENT && p.y.abs() <= SCATTER_EXTENT && p.z.abs() <= SCATTER_EXTENT);
    }

    scene.clear();
    assert!(scene.is_empty());
}
