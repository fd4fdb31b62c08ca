//! Fixed catalog content served by the mock.

use std::collections::HashMap;

use serde_json::{json, Value};

fn drinks() -> Vec<Value> {
    vec![
        json!({
            "id": "mojito", "name": "Mojito", "isAlcoholic": true, "isCarbonated": true,
            "hasVideo": true, "skill": "easy", "servedIn": "highball",
            "ingredients": ["white-rum", "lime", "mint", "soda-water"],
            "occasions": ["summer"], "tools": ["muddler"], "tastes": ["fresh"]
        }),
        json!({
            "id": "caipirinha", "name": "Caipirinha", "isAlcoholic": true, "isCarbonated": false,
            "hasVideo": false, "skill": "easy", "servedIn": "old-fashioned",
            "ingredients": ["cachaca", "lime", "sugar"],
            "occasions": ["summer", "party"], "tools": ["muddler"], "tastes": ["sour"]
        }),
        json!({
            "id": "virgin-mojito", "name": "Virgin Mojito", "isAlcoholic": false, "isCarbonated": true,
            "hasVideo": false, "skill": "easy", "servedIn": "highball",
            "ingredients": ["lime", "mint", "soda-water"],
            "occasions": ["summer"], "tools": ["muddler"], "tastes": ["fresh"]
        }),
        json!({
            "id": "cosmopolitan", "name": "Cosmopolitan", "isAlcoholic": true, "isCarbonated": false,
            "hasVideo": true, "skill": "advanced", "servedIn": "cocktail",
            "ingredients": ["absolut-citron", "cointreau", "lime", "cranberry-juice"],
            "occasions": ["party"], "tools": ["shaker"], "tastes": ["fruity"]
        }),
        json!({
            "id": "screwdriver", "name": "Screwdriver", "isAlcoholic": true, "isCarbonated": false,
            "hasVideo": false, "skill": "easy", "servedIn": "highball",
            "ingredients": ["absolut-vodka", "orange-juice"],
            "occasions": ["brunch"], "tools": [], "tastes": ["fruity"]
        }),
    ]
}

fn named(ids: &[(&str, &str)]) -> Vec<Value> {
    ids.iter().map(|(id, name)| json!({ "id": id, "name": name })).collect()
}

pub fn resources() -> HashMap<String, Vec<Value>> {
    let mut resources = HashMap::new();
    resources.insert("drinks".to_string(), drinks());
    resources.insert(
        "ingredients".to_string(),
        named(&[
            ("white-rum", "White Rum"),
            ("lime", "Lime"),
            ("mint", "Mint"),
            ("soda-water", "Soda Water"),
            ("cachaca", "Cachaca"),
            ("absolut-vodka", "Absolut Vodka"),
        ]),
    );
    resources.insert(
        "glasses".to_string(),
        named(&[("highball", "Highball"), ("old-fashioned", "Old Fashioned"), ("cocktail", "Cocktail")]),
    );
    resources.insert(
        "occasions".to_string(),
        named(&[("summer", "Summer"), ("party", "Party"), ("brunch", "Brunch")]),
    );
    resources.insert("tastes".to_string(), named(&[("fresh", "Fresh"), ("sour", "Sour"), ("fruity", "Fruity")]));
    resources.insert("tools".to_string(), named(&[("muddler", "Muddler"), ("shaker", "Shaker")]));
    resources.insert("drinktypes".to_string(), named(&[("cocktail", "Cocktail"), ("shot", "Shot")]));
    resources.insert("ingredienttypes".to_string(), named(&[("spirits", "Spirits"), ("fruit", "Fruit")]));
    resources.insert("actions".to_string(), named(&[("shake", "Shake"), ("muddle", "Muddle")]));
    resources.insert(
        "illhaveones".to_string(),
        vec![
            json!({ "id": "iho-1", "drink": "mojito", "city": "stockholm" }),
            json!({ "id": "iho-2", "drink": "cosmopolitan", "city": "new-york" }),
        ],
    );
    resources
}
