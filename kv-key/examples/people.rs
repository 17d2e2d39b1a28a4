use std::collections::BTreeMap;

use kv_key::{KeyError, KeyExtractor, KeyRecord, RecordViews, key};

#[derive(KeyRecord, Clone, Debug)]
pub struct Person {
    #[index]
    pub age: u32,
    pub first: String,
    pub last: String,
    pub zip: String,
}

impl Person {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first, self.last)
    }
}

pub fn extract_zip(person: &Person) -> String {
    person.zip.clone()
}

#[derive(KeyRecord, Debug)]
pub struct Employee {
    #[view]
    pub person: Person,
    #[index]
    pub salary: u64,
}

// 简单的有序索引，代替真正的多索引容器
fn index_by<R, E>(extractor: &E, records: Vec<R>) -> BTreeMap<E::Key, R>
where
    E: KeyExtractor<R>,
    E::Key: Ord,
{
    records
        .into_iter()
        .map(|mut record| (extractor.key_of(&mut record), record))
        .collect()
}

fn person(age: u32, first: &str, last: &str, zip: &str) -> Person {
    Person {
        age,
        first: first.to_string(),
        last: last.to_string(),
        zip: zip.to_string(),
    }
}

fn main() -> Result<(), KeyError> {
    env_logger::init();

    println!("{:?}", kv_key::catalog::all_selectors());
    println!("{:?} {:?}", Person::age_key(), Employee::salary_key());

    let by_age_name_zip = key!(Person.age, Person::full_name(), extract_zip(&Person))
        .build::<Person>(&RecordViews::new())?;
    println!("{:?}", by_age_name_zip);

    let people = vec![
        person(36, "Ada", "Lovelace", "W1"),
        person(45, "Grace", "Hopper", "10001"),
        person(36, "Alan", "Turing", "SW1"),
    ];
    for (key, person) in index_by(&by_age_name_zip, people.clone()) {
        println!("{:?} => {}", key, person.full_name());
    }

    let views = RecordViews::registered();
    let by_salary_age = key!(Employee.salary, Person.age).build::<Employee>(&views)?;
    let staff: Vec<Employee> = people
        .into_iter()
        .zip([120, 150, 120])
        .map(|(person, salary)| Employee { person, salary })
        .collect();
    for (key, employee) in index_by(&by_salary_age, staff) {
        println!("{:?} => {}", key, employee.person.full_name());
    }

    Ok(())
}
