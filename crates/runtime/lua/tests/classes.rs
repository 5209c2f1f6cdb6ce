//! Classes: construction, inheritance, super calls and accessors.

use rhizome_tslua_core::CompilerOptions;
use rhizome_tslua_runtime_lua::execute_ts;
use serde_json::{Value, json};

fn run(source: &str) -> Value {
    match execute_ts(source, &CompilerOptions::default()) {
        Ok(exports) => exports["result"].clone(),
        Err(err) => panic!("execution failed: {}\nsource:\n{}", err, source),
    }
}

#[test]
fn test_fields_and_methods() {
    let result = run(
        "class Point {
            x = 0;
            constructor(public y: number) {}
            sum() {
                return this.x + this.y;
            }
        }
        const p = new Point(3);
        p.x = 4;
        export const result = [p.sum(), p.y];",
    );
    assert_eq!(result, json!([7, 3]));
}

#[test]
fn test_field_initializers_run_before_constructor() {
    let result = run(
        "class Box {
            items: number[] = [];
            size: number;
            constructor() {
                this.size = this.items.length + 1;
            }
        }
        export const result = new Box().size;",
    );
    assert_eq!(result, json!(1));
}

#[test]
fn test_inheritance_and_super() {
    let result = run(
        "class Animal {
            constructor(public name: string) {}
            speak(): string {
                return this.name + \" makes a sound\";
            }
        }
        class Dog extends Animal {
            constructor(name: string, public tricks: number) {
                super(name);
            }
            speak(): string {
                return super.speak() + \" and barks\";
            }
        }
        const d = new Dog(\"Rex\", 2);
        export const result = [d.speak(), d.tricks, d.name];",
    );
    assert_eq!(result, json!(["Rex makes a sound and barks", 2, "Rex"]));
}

#[test]
fn test_inherited_constructor() {
    let result = run(
        "class Base {
            constructor(public value: number) {}
        }
        class Derived extends Base {
            doubled() {
                return this.value * 2;
            }
        }
        export const result = new Derived(21).doubled();",
    );
    assert_eq!(result, json!(42));
}

#[test]
fn test_base_constructor_runs_once() {
    let result = run(
        "let constructed = 0;
        class A {
            constructor() {
                constructed++;
            }
        }
        class B extends A {
            constructor() {
                super();
            }
        }
        class C extends B {}
        new C();
        export const result = constructed;",
    );
    assert_eq!(result, json!(1));
}

#[test]
fn test_accessors() {
    let result = run(
        "class Temperature {
            private celsius = 0;
            get fahrenheit() {
                return this.celsius * 9 / 5 + 32;
            }
            set fahrenheit(value: number) {
                this.celsius = (value - 32) * 5 / 9;
            }
        }
        const t = new Temperature();
        const before = t.fahrenheit;
        t.fahrenheit = 212;
        export const result = [before, t.fahrenheit];",
    );
    assert_eq!(result, json!([32, 212]));
}

#[test]
fn test_static_members() {
    let result = run(
        "class Counter {
            static count = 10;
            static increment() {
                Counter.count++;
                return Counter.count;
            }
        }
        Counter.increment();
        export const result = Counter.increment();",
    );
    assert_eq!(result, json!(12));
}

#[test]
fn test_instanceof() {
    let result = run(
        "class Shape {}
        class Square extends Shape {}
        class Other {}
        const s = new Square();
        export const result = [s instanceof Square, s instanceof Shape, s instanceof Other];",
    );
    assert_eq!(result, json!([true, true, false]));
}

#[test]
fn test_method_passed_as_callback() {
    let result = run(
        "class Scaler {
            constructor(private factor: number) {}
            scale(values: number[]) {
                return values.map(v => v * this.factor);
            }
        }
        export const result = new Scaler(3).scale([1, 2]);",
    );
    assert_eq!(result, json!([3, 6]));
}

#[test]
fn test_class_expression() {
    let result = run(
        "const Named = class {
            greet() {
                return \"hi\";
            }
        };
        export const result = new Named().greet();",
    );
    assert_eq!(result, json!("hi"));
}
