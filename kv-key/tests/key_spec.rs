use kv_key::{
    KeyError, KeyExtractor, KeyRecord, RecordViews, SelectorKind, TypeDesc, catalog, key,
};

#[derive(KeyRecord, Clone, Debug, PartialEq)]
pub struct Person {
    #[index]
    pub age: u32,
    pub first: String,
    pub last: String,
    #[index]
    pub zip: String,
    pub tickets: u64,
}

impl Person {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first, self.last)
    }

    pub fn next_ticket(&mut self) -> u64 {
        self.tickets += 1;
        self.tickets
    }
}

pub fn extract_zip(person: &Person) -> String {
    person.zip.clone()
}

pub fn initials(person: Person) -> String {
    format!(
        "{}{}",
        person.first.chars().next().unwrap_or_default(),
        person.last.chars().next().unwrap_or_default()
    )
}

#[derive(KeyRecord, Debug)]
pub struct Employee {
    #[view]
    pub person: Person,
    #[index]
    pub salary: u64,
}

#[derive(KeyRecord, Debug)]
pub struct Manager {
    #[view]
    pub employee: Employee,
    #[index]
    pub reports: u32,
}

pub struct Contractor {
    pub person: Person,
    pub rate: u32,
}

kv_key::record_view!(Contractor => Person: person);

pub struct Invoice {
    pub total: u64,
}

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn grace() -> Person {
    Person {
        age: 45,
        first: "Grace".to_string(),
        last: "Hopper".to_string(),
        zip: "10001".to_string(),
        tickets: 0,
    }
}

#[test]
fn mixed_kind_key_over_person() {
    init();
    let key = key!(Person.age, Person::full_name(), extract_zip(&Person))
        .build::<Person>(&RecordViews::new())
        .unwrap();

    assert_eq!(key.record_type(), TypeDesc::of::<Person>());
    assert_eq!(
        key.key_types(),
        vec![
            TypeDesc::of::<u32>(),
            TypeDesc::of::<String>(),
            TypeDesc::of::<String>()
        ]
    );
    let mut person = grace();
    assert_eq!(
        key.extract(&mut person),
        (45, "Grace Hopper".to_string(), "10001".to_string())
    );
}

#[test]
fn macro_classifies_every_shape() {
    let spec = key!(
        Person.age,
        Person::full_name(),
        &mut Person::next_ticket(),
        extract_zip(&Person),
        initials(Person),
    );
    let kinds: Vec<_> = spec.classify().unwrap().iter().map(|s| s.kind).collect();
    assert_eq!(
        kinds,
        vec![
            SelectorKind::Field,
            SelectorKind::Accessor,
            SelectorKind::AccessorMut,
            SelectorKind::Function,
            SelectorKind::Function,
        ]
    );

    let key = spec.build::<Person>(&RecordViews::new()).unwrap();
    assert!(!key.is_read_only());
    let mut person = grace();
    let (_, _, first_ticket, _, monogram) = key.extract(&mut person);
    assert_eq!(first_ticket, 1);
    assert_eq!(monogram, "GH");
    assert_eq!(key.key_of(&mut person).2, 2);
    assert_eq!(person.tickets, 2);
}

#[test]
fn derived_selectors_match_macro_selectors() {
    let derived = kv_key::KeySpec::new((Person::age_key(), Person::zip_key()))
        .build::<Person>(&RecordViews::new())
        .unwrap();
    let declared = key!(Person.age, Person.zip)
        .build::<Person>(&RecordViews::new())
        .unwrap();

    let mut person = grace();
    assert_eq!(derived.extract(&mut person), declared.extract(&mut person));
    assert_eq!(derived.selectors(), declared.selectors());
}

#[test]
fn registered_views_widen_to_outer_record() {
    init();
    let views = RecordViews::registered();
    assert!(views.len() >= 2);

    let key = key!(Person.age, Employee.salary, Person::full_name())
        .build::<Employee>(&views)
        .unwrap();
    assert_eq!(key.record_type(), TypeDesc::of::<Employee>());

    let mut employee = Employee {
        person: grace(),
        salary: 9000,
    };
    assert_eq!(
        key.extract(&mut employee),
        (45, 9000, "Grace Hopper".to_string())
    );

    let key = key!(Contractor.rate, &mut Person::next_ticket())
        .build::<Contractor>(&views)
        .unwrap();
    let mut contractor = Contractor {
        person: grace(),
        rate: 120,
    };
    assert_eq!(key.extract(&mut contractor), (120, 1));
    assert_eq!(contractor.person.tickets, 1);
}

#[test]
fn sibling_records_do_not_unify() {
    let views = RecordViews::registered();
    let err = key!(Employee.salary, Contractor.rate)
        .build::<Employee>(&views)
        .unwrap_err();
    assert_eq!(
        err,
        KeyError::IncompatibleRecordTypes {
            left: TypeDesc::of::<Employee>(),
            right: TypeDesc::of::<Contractor>(),
        }
    );

    let err = key!(Person.age, Invoice.total)
        .resolve(&views)
        .unwrap_err();
    assert!(matches!(err, KeyError::IncompatibleRecordTypes { .. }));
    assert!(err.to_string().contains("one must be convertible to the other"));
}

#[test]
fn siblings_never_unify_in_any_order() {
    let views = RecordViews::registered();
    // Person 可以转换为 Employee 与 Contractor，但两者之间互不可转换
    assert!(
        key!(Person.age, Employee.salary, Contractor.rate)
            .resolve(&views)
            .is_err()
    );
    assert!(
        key!(Employee.salary, Person.age, Contractor.rate)
            .resolve(&views)
            .is_err()
    );
    assert_eq!(
        key!(Person.age, Person.zip, Employee.salary)
            .resolve(&views)
            .unwrap(),
        TypeDesc::of::<Employee>()
    );
}

fn manager() -> Manager {
    Manager {
        employee: Employee {
            person: grace(),
            salary: 9000,
        },
        reports: 3,
    }
}

#[test]
fn nested_views_resolve_in_either_order() {
    init();
    let views = RecordViews::registered();

    let inner_first = key!(Person.age, Employee.salary, Manager.reports);
    assert_eq!(
        inner_first.resolve(&views).unwrap(),
        TypeDesc::of::<Manager>()
    );
    let outer_first = key!(Manager.reports, Employee.salary, Person.age);
    assert_eq!(
        outer_first.resolve(&views).unwrap(),
        TypeDesc::of::<Manager>()
    );

    let mut boss = manager();
    let key = inner_first.build::<Manager>(&views).unwrap();
    assert_eq!(key.extract(&mut boss), (45, 9000, 3));
    let key = outer_first.build::<Manager>(&views).unwrap();
    assert_eq!(key.extract_ref(&boss), Some((3, 9000, 45)));

    // Person 与 Manager 之间隔了一层 Employee
    let key = key!(Manager.reports, &mut Person::next_ticket(), Person::full_name())
        .build::<Manager>(&views)
        .unwrap();
    assert_eq!(key.extract(&mut boss), (3, 1, "Grace Hopper".to_string()));
    assert_eq!(key.extract_ref(&boss), None);
    assert_eq!(boss.employee.person.tickets, 1);
}

#[test]
fn nested_views_do_not_reach_siblings() {
    let views = RecordViews::registered();
    assert!(
        key!(Manager.reports, Contractor.rate)
            .resolve(&views)
            .is_err()
    );
    assert!(
        key!(Person.age, Manager.reports, Contractor.rate)
            .resolve(&views)
            .is_err()
    );
}

#[test]
fn catalog_lists_derived_selectors() {
    let selectors = catalog::all_selectors();
    let person = selectors
        .iter()
        .find(|(path, _)| path.ends_with("::Person"))
        .map(|(_, names)| names.clone())
        .unwrap();
    assert!(person.contains(&"age"));
    assert!(person.contains(&"zip"));

    let salary = catalog::describe::<Employee>("salary").unwrap();
    assert_eq!(salary.kind, SelectorKind::Field);
    assert_eq!(salary.key, TypeDesc::of::<u64>());

    assert!(matches!(
        catalog::describe::<Employee>("bonus"),
        Err(KeyError::UnrecognizedSelectorShape { .. })
    ));
}
