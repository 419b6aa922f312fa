use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use super::{AggregateByDiet, CleanedDataset, MacroMeans, TopProteinByDiet};

/// Records kept per diet group in the top-protein table
pub const TOP_N: usize = 5;

#[derive(Default)]
struct Accumulator {
    sums: [f64; 3],
    counts: [usize; 3],
}

impl Accumulator {
    fn add(&mut self, values: [Option<f64>; 3]) {
        for (i, value) in values.into_iter().enumerate() {
            if let Some(v) = value {
                self.sums[i] += v;
                self.counts[i] += 1;
            }
        }
    }

    fn mean(&self, i: usize) -> f64 {
        if self.counts[i] == 0 {
            f64::NAN
        } else {
            self.sums[i] / self.counts[i] as f64
        }
    }
}

/// Mean protein, carbs and fat per cleaned diet type.
///
/// Unknown macronutrient cells are skipped; a group with no value for a
/// column gets NaN for it.
pub fn aggregate_by_diet(cleaned: &CleanedDataset) -> AggregateByDiet {
    let mut accumulators: BTreeMap<&str, Accumulator> = BTreeMap::new();

    for record in &cleaned.records {
        accumulators
            .entry(record.diet_type.as_str())
            .or_default()
            .add([record.protein_g, record.carbs_g, record.fat_g]);
    }

    let groups = accumulators
        .into_iter()
        .map(|(diet, acc)| {
            (
                diet.to_string(),
                MacroMeans {
                    protein: acc.mean(0),
                    carbs: acc.mean(1),
                    fat: acc.mean(2),
                },
            )
        })
        .collect();

    AggregateByDiet { groups }
}

/// Descending by protein with unknown values last
fn by_protein_desc(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// The [`TOP_N`] highest-protein records of each diet group.
///
/// All records are stable-sorted by descending protein, so ties keep source
/// order, then the first [`TOP_N`] of each group are kept. The result stays in
/// that global sorted order.
pub fn top_protein_by_diet(cleaned: &CleanedDataset) -> TopProteinByDiet {
    let mut order: Vec<usize> = (0..cleaned.records.len()).collect();
    order.sort_by(|&a, &b| {
        by_protein_desc(cleaned.records[a].protein_g, cleaned.records[b].protein_g)
    });

    let mut taken: HashMap<&str, usize> = HashMap::new();
    let records = order
        .into_iter()
        .map(|i| &cleaned.records[i])
        .filter(|record| {
            let count = taken.entry(record.diet_type.as_str()).or_default();
            *count += 1;
            *count <= TOP_N
        })
        .cloned()
        .collect();

    TopProteinByDiet { records }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::parse_csv;
    use crate::transform::clean;

    fn cleaned(csv: &str) -> CleanedDataset {
        clean(&parse_csv(csv.as_bytes()).unwrap())
    }

    #[test]
    fn test_aggregate_keys_are_cleaned_diets() {
        let data = cleaned(
            "Diet_type,Protein(g),Carbs(g),Fat(g)\n\
             vegan,1,2,3\n\
             VEGAN ,3,4,5\n\
             paleo,10,0,1\n",
        );
        let aggregate = aggregate_by_diet(&data);

        let keys: Vec<&str> = aggregate.groups.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["Paleo", "Vegan"]);
        assert_eq!(
            aggregate.get("Vegan"),
            Some(&MacroMeans {
                protein: 2.0,
                carbs: 3.0,
                fat: 4.0
            })
        );
    }

    #[test]
    fn test_top_protein_limits_each_group() {
        let mut csv = String::from("Diet_type,Protein(g),Carbs(g),Fat(g)\n");
        for p in [3, 9, 1, 7, 5, 8, 2] {
            csv.push_str(&format!("keto,{p},1,1\n"));
        }
        csv.push_str("vegan,4,1,1\n");

        let top = top_protein_by_diet(&cleaned(&csv));
        let keto: Vec<f64> = top
            .records
            .iter()
            .filter(|r| r.diet_type == "Keto")
            .filter_map(|r| r.protein_g)
            .collect();

        assert_eq!(keto, vec![9.0, 8.0, 7.0, 5.0, 3.0]);
        assert_eq!(top.records.len(), 6);
        // Global descending order: vegan's 4 sits between keto's 5 and 3
        assert_eq!(top.records[4].diet_type, "Vegan");
    }

    #[test]
    fn test_top_protein_ties_keep_source_order() {
        let data = cleaned(
            "Diet_type,Recipe_name,Protein(g),Carbs(g),Fat(g)\n\
             dash,first,5,1,1\n\
             dash,second,5,1,1\n",
        );
        let top = top_protein_by_diet(&data);

        assert_eq!(top.records[0].extra, vec!["first"]);
        assert_eq!(top.records[1].extra, vec!["second"]);
    }

    #[test]
    fn test_selected_records_dominate_the_rest() {
        let mut csv = String::from("Diet_type,Protein(g),Carbs(g),Fat(g)\n");
        for p in [12, 3, 40, 7, 7, 19, 0, 25, 11] {
            csv.push_str(&format!("mediterranean,{p},1,1\n"));
        }
        let data = cleaned(&csv);
        let top = top_protein_by_diet(&data);

        let selected_min = top
            .records
            .iter()
            .filter_map(|r| r.protein_g)
            .fold(f64::INFINITY, f64::min);
        let rest_max = [3.0, 7.0, 0.0, 7.0]
            .into_iter()
            .fold(f64::NEG_INFINITY, f64::max);

        assert_eq!(top.records.len(), TOP_N);
        assert!(selected_min >= rest_max);
    }
}
