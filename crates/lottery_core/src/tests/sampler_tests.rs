use super::*;
use rand::{rngs::StdRng, SeedableRng};
use scene::card::table_roster;

fn people(count: u64) -> Vec<Person> {
    (1..=count)
        .map(|id| Person::new(id, format!("U{id}"), format!("Person {id}"), format!("1390000{id:04}")))
        .collect()
}

fn scene_for(people: &[Person], rng: &mut StdRng) -> Scene {
    let mut scene = Scene::new();
    scene.populate(&table_roster(people, 7), &Palette::default(), rng);
    scene
}

#[test]
fn never_touches_protected_cards_or_transforms() {
    let mut rng = StdRng::seed_from_u64(7);
    let everyone = people(60);
    let mut scene = scene_for(&everyone, &mut rng);
    let before = scene.clone();
    let protected = [0, 5, 17, 42];

    let sampler = RefreshSampler::default();
    for _ in 0..500 {
        let touched = sampler.refresh(
            &mut scene,
            &everyone,
            &protected,
            &Palette::default(),
            SkinMode::Sphere,
            &mut rng,
        );
        assert!(touched.len() <= SAMPLES_PER_TICK);
        assert!(touched.iter().all(|card| !protected.contains(card)));
    }

    for (after, before) in scene.cards().iter().zip(before.cards()) {
        assert_eq!(after.transform, before.transform);
        if protected.contains(&after.index()) {
            assert_eq!(after.skin, before.skin);
        }
    }
}

#[test]
fn prefers_people_who_have_not_won() {
    let mut rng = StdRng::seed_from_u64(11);
    let mut everyone = people(10);
    for person in everyone.iter_mut().skip(1) {
        person.is_win = true;
    }
    let mut scene = scene_for(&everyone, &mut rng);
    let sampler = RefreshSampler::default();
    for _ in 0..50 {
        for card in sampler.refresh(
            &mut scene,
            &everyone,
            &[],
            &Palette::default(),
            SkinMode::Default,
            &mut rng,
        ) {
            assert_eq!(scene.card(card).and_then(|c| c.skin.person_id), Some(1));
        }
    }
}

#[test]
fn falls_back_to_winners_when_everyone_has_won() {
    let mut rng = StdRng::seed_from_u64(3);
    let mut everyone = people(3);
    everyone.iter_mut().for_each(|person| person.is_win = true);
    let mut scene = scene_for(&everyone, &mut rng);
    let touched = RefreshSampler::new(50).refresh(
        &mut scene,
        &everyone,
        &[],
        &Palette::default(),
        SkinMode::Sphere,
        &mut rng,
    );
    assert_eq!(touched.len(), 50);
    assert!(touched
        .iter()
        .all(|card| scene.card(*card).is_some_and(|c| c.skin.mode == SkinMode::Sphere)));
}

#[test]
fn nothing_to_do_without_people() {
    let mut rng = StdRng::seed_from_u64(1);
    let mut scene = scene_for(&[], &mut rng);
    let touched = RefreshSampler::default().refresh(
        &mut scene,
        &[],
        &[],
        &Palette::default(),
        SkinMode::Default,
        &mut rng,
    );
    assert!(touched.is_empty());
}
